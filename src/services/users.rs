use chrono::Utc;
use uuid::Uuid;

use super::HealthService;
use crate::error::{Entity, PilotHealthError, Result};
use crate::models::{Base, Role, User};

impl HealthService {
    /// Register a user. Credentials live with the external auth provider.
    pub fn create_user(&self, name: &str, email: &str, role: Role) -> Result<User> {
        let name = name.trim();
        let email = email.trim().to_lowercase();

        if name.is_empty() {
            return Err(PilotHealthError::Validation("Nome é obrigatório.".to_string()));
        }
        if !email.contains('@') {
            return Err(PilotHealthError::Validation(format!(
                "E-mail inválido: {}",
                email
            )));
        }

        let user = User {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            email,
            role,
            created_at: Utc::now(),
        };
        self.db.insert_user(&user)?;

        tracing::info!(user_id = %user.id, role = role.as_str(), "Created user");
        Ok(user)
    }

    pub fn get_user(&self, user_id: &str) -> Result<User> {
        self.db
            .get_user(user_id)?
            .ok_or_else(|| PilotHealthError::not_found(Entity::User, user_id))
    }

    pub fn list_professionals(&self) -> Result<Vec<User>> {
        self.db.users_with_role(Role::Professional)
    }

    pub fn list_bases(&self) -> Result<Vec<Base>> {
        self.db.list_bases()
    }

    pub fn ensure_base(&self, name: &str) -> Result<Base> {
        let name = name.trim();
        if name.is_empty() {
            return Err(PilotHealthError::Validation(
                "Nome da base é obrigatório.".to_string(),
            ));
        }
        self.db.ensure_base(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TriageSettings;
    use crate::database::Database;
    use crate::error::DatabaseError;

    fn service() -> HealthService {
        HealthService::new(Database::in_memory().unwrap(), TriageSettings::default(), 50)
    }

    #[test]
    fn test_create_user_normalizes_email() {
        let svc = service();
        let user = svc
            .create_user("  Ten. Andrade ", "Andrade@FAB.mil.br", Role::Pilot)
            .unwrap();
        assert_eq!(user.name, "Ten. Andrade");
        assert_eq!(user.email, "andrade@fab.mil.br");
        assert_eq!(svc.get_user(&user.id).unwrap(), user);
    }

    #[test]
    fn test_create_user_rejects_duplicates_and_bad_input() {
        let svc = service();
        svc.create_user("Dra. Melo", "melo@fab.mil.br", Role::Professional)
            .unwrap();

        let err = svc
            .create_user("Outra Melo", "MELO@fab.mil.br", Role::Professional)
            .unwrap_err();
        assert!(matches!(
            err,
            PilotHealthError::Database(DatabaseError::Duplicate { .. })
        ));
        assert!(svc.create_user("", "x@y.z", Role::Pilot).is_err());
        assert!(svc.create_user("Sem Email", "invalid", Role::Pilot).is_err());
    }

    #[test]
    fn test_list_professionals_only() {
        let svc = service();
        svc.create_user("Piloto", "p@fab.mil.br", Role::Pilot).unwrap();
        svc.create_user("Fisio", "f@fab.mil.br", Role::Professional)
            .unwrap();

        let pros = svc.list_professionals().unwrap();
        assert_eq!(pros.len(), 1);
        assert_eq!(pros[0].name, "Fisio");
    }

    #[test]
    fn test_unknown_user_is_not_found() {
        let err = service().get_user("nope").unwrap_err();
        assert_eq!(err.user_message(), "Usuário não encontrado.");
    }
}
