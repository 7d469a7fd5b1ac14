use lavanderia_core::ServiceError;
use tracing::info;

use crate::model::{
    Batch, Branch, Client, Counters, Garment, HistoryEntry, NewBranch, NewUser, Notification,
    Settings, User, UserRole, max_id,
};
use crate::store::Collection;
use super::{not_found, position, require_text, LaundryService};

const DEFAULT_BRANCH: &str = "Sucursal Principal";

impl LaundryService {
    // ========================================================================
    // Branches
    // ========================================================================

    pub fn get_branches(&self) -> Vec<Branch> {
        self.store.list(Collection::Branches)
    }

    pub fn get_active_branches(&self) -> Vec<Branch> {
        self.get_branches().into_iter().filter(|b| b.is_active).collect()
    }

    pub fn add_branch(&self, input: NewBranch) -> Result<Branch, ServiceError> {
        require_text("name", &input.name)?;
        let mut branches = self.get_branches();

        let mut uow = self.begin();
        let branch = Branch {
            id: Counters::assign(&mut uow.counters.branches, max_id(&branches)),
            name: input.name.trim().to_string(),
            address: input.address,
            phone: input.phone,
            is_active: true,
        };
        branches.push(branch.clone());
        uow.put(Collection::Branches, &branches)?;
        uow.commit()?;
        Ok(branch)
    }

    pub fn update_branch(&self, id: u64, patch: serde_json::Value) -> Result<Branch, ServiceError> {
        let mut branches = self.get_branches();
        let idx = position(&branches, id).ok_or_else(|| not_found("branch", id))?;
        let updated: Branch = Self::apply_patch(&branches[idx], &patch, &["id"])?;
        require_text("name", &updated.name)?;
        branches[idx] = updated.clone();
        self.store.set(Collection::Branches, &branches)?;
        Ok(updated)
    }

    // ========================================================================
    // Users
    // ========================================================================

    pub fn get_users(&self) -> Vec<User> {
        self.store.list(Collection::Users)
    }

    pub fn add_user(&self, input: NewUser) -> Result<User, ServiceError> {
        require_text("username", &input.username)?;
        require_text("name", &input.name)?;
        let mut users = self.get_users();
        let username = input.username.trim().to_string();
        check_username(&users, &username, None)?;

        let mut uow = self.begin();
        let user = User {
            id: Counters::assign(&mut uow.counters.users, max_id(&users)),
            username,
            name: input.name.trim().to_string(),
            role: input.role,
            branch_id: input.branch_id,
            is_active: true,
        };
        users.push(user.clone());
        uow.put(Collection::Users, &users)?;
        uow.commit()?;
        Ok(user)
    }

    pub fn update_user(&self, id: u64, patch: serde_json::Value) -> Result<User, ServiceError> {
        let mut users = self.get_users();
        let idx = position(&users, id).ok_or_else(|| not_found("user", id))?;
        let mut updated: User = Self::apply_patch(&users[idx], &patch, &["id"])?;
        require_text("username", &updated.username)?;
        require_text("name", &updated.name)?;
        updated.username = updated.username.trim().to_string();
        check_username(&users, &updated.username, Some(id))?;
        users[idx] = updated.clone();
        self.store.set(Collection::Users, &users)?;
        Ok(updated)
    }

    // ========================================================================
    // Settings
    // ========================================================================

    pub fn get_settings(&self) -> Settings {
        self.store.settings()
    }

    /// Shallow-merge `patch` into the settings document.
    pub fn update_settings(&self, patch: serde_json::Value) -> Result<Settings, ServiceError> {
        let updated: Settings = Self::apply_patch(&self.get_settings(), &patch, &[])?;
        require_text("batchPrefix", &updated.batch_prefix)?;
        require_text("rfidPrefix", &updated.rfid_prefix)?;
        self.store.set(Collection::Settings, &updated)?;
        Ok(updated)
    }

    // ========================================================================
    // Counters
    // ========================================================================

    pub fn get_counters(&self) -> Counters {
        self.store.counters()
    }

    /// Recompute every counter from the stored records: `max(id) + 1`.
    pub fn fix_counters(&self) -> Result<Counters, ServiceError> {
        let counters = Counters {
            clients: Counters::after(&self.store.list::<Client>(Collection::Clients)),
            garments: Counters::after(&self.store.list::<Garment>(Collection::Garments)),
            batches: Counters::after(&self.store.list::<Batch>(Collection::Batches)),
            history: Counters::after(&self.store.list::<HistoryEntry>(Collection::History)),
            branches: Counters::after(&self.get_branches()),
            users: Counters::after(&self.get_users()),
            notifications: Counters::after(
                &self.store.list::<Notification>(Collection::Notifications),
            ),
        };
        self.store.set(Collection::Counters, &counters)?;
        info!("counters repaired: {:?}", counters);
        Ok(counters)
    }

    /// Seed a fresh store: default settings, a main branch and an admin
    /// user. Collections that already hold data are left alone.
    pub fn initialize_defaults(&self) -> Result<(), ServiceError> {
        let mut uow = self.begin();
        let mut seeded = false;
        if !self.store.contains(Collection::Settings)? {
            uow.put(Collection::Settings, &Settings::default())?;
            seeded = true;
        }
        let mut branches = self.get_branches();
        if branches.is_empty() {
            branches.push(Branch {
                id: Counters::assign(&mut uow.counters.branches, 0),
                name: DEFAULT_BRANCH.to_string(),
                address: String::new(),
                phone: String::new(),
                is_active: true,
            });
            uow.put(Collection::Branches, &branches)?;
            seeded = true;
        }
        let mut users = self.get_users();
        if users.is_empty() {
            users.push(User {
                id: Counters::assign(&mut uow.counters.users, 0),
                username: "admin".to_string(),
                name: "Administrador".to_string(),
                role: UserRole::Admin,
                branch_id: branches.first().map(|b| b.id),
                is_active: true,
            });
            uow.put(Collection::Users, &users)?;
            seeded = true;
        }
        if !seeded {
            return Ok(());
        }
        uow.commit()?;
        info!("laundry store seeded with defaults");
        Ok(())
    }
}

fn check_username(users: &[User], username: &str, except: Option<u64>) -> Result<(), ServiceError> {
    let taken = users
        .iter()
        .any(|u| Some(u.id) != except && u.username.eq_ignore_ascii_case(username));
    if taken {
        return Err(ServiceError::Conflict(format!(
            "username '{}' is already taken",
            username
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Priority;
    use crate::service::test_support::{client, garment, service};

    #[test]
    fn branches() {
        let svc = service();
        let main = svc
            .add_branch(NewBranch { name: "Centro".into(), ..Default::default() })
            .unwrap();
        let north = svc
            .add_branch(NewBranch { name: "Norte".into(), ..Default::default() })
            .unwrap();
        assert!(north.id > main.id);

        svc.update_branch(north.id, serde_json::json!({"isActive": false})).unwrap();
        assert_eq!(svc.get_branches().len(), 2);
        let active = svc.get_active_branches();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].name, "Centro");

        assert_eq!(
            svc.update_branch(9, serde_json::json!({})).unwrap_err().error_code(),
            "NOT_FOUND"
        );
        assert_eq!(
            svc.add_branch(NewBranch::default()).unwrap_err().error_code(),
            "VALIDATION_FAILED"
        );
    }

    #[test]
    fn users_have_unique_usernames() {
        let svc = service();
        let input = |username: &str| NewUser {
            username: username.into(),
            name: "Luis".into(),
            ..Default::default()
        };
        let luis = svc.add_user(input("luis")).unwrap();
        assert_eq!(luis.role, UserRole::Operador);
        assert_eq!(svc.add_user(input("LUIS")).unwrap_err().error_code(), "ALREADY_EXISTS");

        let marta = svc.add_user(input("marta")).unwrap();
        let err = svc
            .update_user(marta.id, serde_json::json!({"username": "luis"}))
            .unwrap_err();
        assert_eq!(err.error_code(), "ALREADY_EXISTS");

        let updated = svc
            .update_user(marta.id, serde_json::json!({"role": "admin"}))
            .unwrap();
        assert_eq!(updated.role, UserRole::Admin);
        assert_eq!(svc.get_users().len(), 2);
    }

    #[test]
    fn settings_merge() {
        let svc = service();
        assert_eq!(svc.get_settings(), Settings::default());

        let s = svc
            .update_settings(serde_json::json!({"batchPrefix": "LT", "defaultPriority": "alta"}))
            .unwrap();
        assert_eq!(s.batch_prefix, "LT");
        assert_eq!(s.default_priority, Priority::Alta);
        assert_eq!(s.rfid_prefix, "RFID");
        assert_eq!(svc.get_settings(), s);

        let err = svc.update_settings(serde_json::json!({"batchPrefix": ""})).unwrap_err();
        assert_eq!(err.error_code(), "VALIDATION_FAILED");
    }

    #[test]
    fn fix_counters_repairs_stale_values() {
        let svc = service();
        let c = client(&svc, "Ana", "0101");
        garment(&svc, c.id, "camisa");
        garment(&svc, c.id, "falda");
        svc.store.set(Collection::Counters, &Counters::default()).unwrap();

        let fixed = svc.fix_counters().unwrap();
        assert_eq!(fixed.clients, 2);
        assert_eq!(fixed.garments, 3);
        assert_eq!(fixed.batches, 1);
        assert_eq!(fixed.history, svc.get_history().len() as u64 + 1);
        assert_eq!(svc.get_counters(), fixed);
    }

    #[test]
    fn stale_counters_never_reuse_ids() {
        let svc = service();
        let a = client(&svc, "Ana", "0101");
        svc.store.set(Collection::Counters, &Counters::default()).unwrap();
        let b = client(&svc, "Beto", "0202");
        assert!(b.id > a.id);
    }

    #[test]
    fn initialize_defaults_seeds_once() {
        let svc = service();
        svc.initialize_defaults().unwrap();
        let branches = svc.get_branches();
        assert_eq!(branches.len(), 1);
        assert_eq!(branches[0].name, DEFAULT_BRANCH);
        let users = svc.get_users();
        assert_eq!(users[0].role, UserRole::Admin);
        assert_eq!(users[0].branch_id, Some(branches[0].id));
        assert!(svc.store.contains(Collection::Settings).unwrap());

        svc.initialize_defaults().unwrap();
        assert_eq!(svc.get_branches().len(), 1);
        assert_eq!(svc.get_users().len(), 1);
    }
}
