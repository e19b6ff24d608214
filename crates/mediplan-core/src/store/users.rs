//! Staff account operations.

use super::{Store, StoreError, StoreResult};
use crate::auth::hash_password;
use crate::db::StorageKey;
use crate::models::{NewUser, NotificationKind, Role, User, UserPatch, UserProfile};
use crate::validation::{check_user_fields, validate_new_user, ValidationErrors};

impl Store {
    /// Create an account. The password is stored salted and hashed.
    pub fn add_user(&mut self, input: NewUser) -> StoreResult<UserProfile> {
        validate_new_user(&input, &self.users)?;

        let password_hash = hash_password(&input.password);
        let user = User::new(input, password_hash, self.today());
        let profile = user.profile();
        self.users.push(user);
        self.persist(&[StorageKey::Users]);
        self.notify("Utilisateur ajouté", NotificationKind::Success);
        Ok(profile)
    }

    /// Merge `patch` into an account. A non-empty password is re-hashed.
    /// Returns `false` for unknown ids.
    pub fn update_user(&mut self, id: &str, patch: UserPatch) -> StoreResult<bool> {
        let Some(index) = self.users.iter().position(|u| u.id == id) else {
            return Ok(false);
        };

        let new_hash = patch.new_password().map(hash_password);
        let mut updated = self.users[index].clone();
        patch.apply_to(&mut updated);
        if let Some(hash) = new_hash {
            updated.password_hash = hash;
        }

        let mut errors = ValidationErrors::new();
        check_user_fields(
            &mut errors,
            &updated.name,
            &updated.email,
            &updated.phone,
            &self.users,
            Some(id),
        );
        errors.into_result()?;

        let mut keys = vec![StorageKey::Users];
        if self.session.as_ref().is_some_and(|s| s.id == id) {
            self.session = Some(updated.profile());
            keys.push(StorageKey::Auth);
        }
        self.users[index] = updated;
        self.persist(&keys);
        self.notify("Utilisateur mis à jour", NotificationKind::Success);
        Ok(true)
    }

    /// Delete an account. The signed-in user and admins cannot be deleted.
    /// Returns `Ok(false)` for unknown ids.
    pub fn delete_user(&mut self, id: &str) -> StoreResult<bool> {
        let Some(user) = self.get_user_by_id(id) else {
            return Ok(false);
        };
        if self.session.as_ref().is_some_and(|s| s.id == id) {
            return Err(StoreError::ProtectedUser(
                "Impossible de supprimer l'utilisateur connecté".into(),
            ));
        }
        if user.role == Role::Admin {
            return Err(StoreError::ProtectedUser(
                "Impossible de supprimer un administrateur".into(),
            ));
        }

        self.users.retain(|u| u.id != id);
        self.persist(&[StorageKey::Users]);
        self.notify("Utilisateur supprimé", NotificationKind::Success);
        Ok(true)
    }

    /// Whether `delete_user` would accept this id.
    pub fn can_delete_user(&self, id: &str) -> bool {
        let is_current = self.session.as_ref().is_some_and(|s| s.id == id);
        self.get_user_by_id(id)
            .is_some_and(|u| u.role != Role::Admin && !is_current)
    }

    pub fn get_user_by_id(&self, id: &str) -> Option<&User> {
        self.users.iter().find(|u| u.id == id)
    }

    /// Users who can be assigned appointments.
    pub fn get_practitioners(&self) -> Vec<&User> {
        self.users.iter().filter(|u| u.role.is_practitioner()).collect()
    }
}
