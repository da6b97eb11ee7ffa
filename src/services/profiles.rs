use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::HealthService;
use crate::error::{Entity, PilotHealthError, Result};
use crate::models::{Actor, Profile, ProfileUpdate, Role};

impl HealthService {
    /// Profile of the caller; empty when nothing was saved yet
    pub fn get_profile(&self, actor: &Actor) -> Result<Profile> {
        self.get_user(&actor.user_id)?;
        Ok(self.db.get_profile(&actor.user_id)?.unwrap_or_else(|| Profile {
            user_id: actor.user_id.clone(),
            ..Default::default()
        }))
    }

    /// Merge `update` into the caller's profile and store it
    pub fn update_profile(&self, actor: &Actor, update: ProfileUpdate) -> Result<Profile> {
        validate_update(actor.role, &update)?;
        if let Some(base_id) = update.base_id {
            if !self.db.base_exists(base_id)? {
                return Err(PilotHealthError::not_found(Entity::Base, base_id.to_string()));
            }
        }

        let mut profile = self.get_profile(actor)?;
        merge(&mut profile.rank, update.rank);
        merge(&mut profile.saram, update.saram);
        merge(&mut profile.aircraft_type, update.aircraft_type);
        merge(&mut profile.base_id, update.base_id);
        merge(&mut profile.birth_date, update.birth_date);
        merge(&mut profile.weight_kg, update.weight_kg);
        merge(&mut profile.height_m, update.height_m);
        merge(&mut profile.whatsapp, update.whatsapp);
        merge(&mut profile.crm_crefito, update.crm_crefito);

        self.db.upsert_profile(&profile)?;
        tracing::info!(user_id = %actor.user_id, "Updated profile");

        // Re-read to pick up the base name
        self.get_profile(actor)
    }
}

fn merge<T>(slot: &mut Option<T>, value: Option<T>) {
    if value.is_some() {
        *slot = value;
    }
}

fn validate_update(role: Role, update: &ProfileUpdate) -> Result<()> {
    if let Some(weight) = update.weight_kg {
        if weight <= Decimal::ZERO {
            return Err(PilotHealthError::Validation(
                "Peso deve ser maior que zero.".to_string(),
            ));
        }
    }
    if let Some(height) = update.height_m {
        if height <= Decimal::ZERO || height >= dec!(3) {
            return Err(PilotHealthError::Validation(
                "Altura deve estar entre 0 e 3 metros.".to_string(),
            ));
        }
    }

    let pilot_fields = update.rank.is_some()
        || update.saram.is_some()
        || update.aircraft_type.is_some()
        || update.base_id.is_some()
        || update.birth_date.is_some()
        || update.weight_kg.is_some()
        || update.height_m.is_some();

    match role {
        Role::Professional if pilot_fields => Err(PilotHealthError::Validation(
            "Campos de piloto não se aplicam a profissionais.".to_string(),
        )),
        Role::Pilot if update.crm_crefito.is_some() => Err(PilotHealthError::Validation(
            "CRM/CREFITO só se aplica a profissionais.".to_string(),
        )),
        _ => Ok(()),
    }
}
