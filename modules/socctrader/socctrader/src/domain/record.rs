//! Binding of the SDK record types to the generic domain machinery.

use std::fmt::Debug;

use serde::Serialize;
use serde::de::DeserializeOwned;
use socctrader_sdk::{
    Country, CountryDraft, EntityKind, FinancialAction, FinancialActionDraft, Game, GameDraft,
    League, LeagueDraft, Region, RegionDraft, Team, TeamDraft,
};

use crate::domain::error::DomainError;

/// A stored record: identity and version are assigned by the store.
pub trait Record: Serialize + DeserializeOwned + Clone + Debug + Send + Sync + 'static {
    const KIND: EntityKind;

    /// Business fields accepted on create and update.
    type Draft: Clone + Debug + Send + Sync + 'static;

    fn id(&self) -> i64;

    fn version(&self) -> i64;

    /// Required-field checks run before the store is touched.
    ///
    /// # Errors
    /// Returns [`DomainError::Validation`] naming the offending field.
    fn validate(_draft: &Self::Draft) -> Result<(), DomainError> {
        Ok(())
    }
}

fn require_name(field: &str, value: Option<&str>) -> Result<(), DomainError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(()),
        Some(_) => Err(DomainError::validation(field, "must not be blank")),
        None => Err(DomainError::validation(field, "must not be null")),
    }
}

impl Record for Country {
    const KIND: EntityKind = EntityKind::Country;
    type Draft = CountryDraft;

    fn id(&self) -> i64 {
        self.id
    }

    fn version(&self) -> i64 {
        self.version
    }

    fn validate(draft: &CountryDraft) -> Result<(), DomainError> {
        require_name("countryName", draft.country_name.as_deref())
    }
}

impl Record for Region {
    const KIND: EntityKind = EntityKind::Region;
    type Draft = RegionDraft;

    fn id(&self) -> i64 {
        self.id
    }

    fn version(&self) -> i64 {
        self.version
    }
}

impl Record for League {
    const KIND: EntityKind = EntityKind::League;
    type Draft = LeagueDraft;

    fn id(&self) -> i64 {
        self.id
    }

    fn version(&self) -> i64 {
        self.version
    }

    fn validate(draft: &LeagueDraft) -> Result<(), DomainError> {
        require_name("leagueName", draft.league_name.as_deref())
    }
}

impl Record for Team {
    const KIND: EntityKind = EntityKind::Team;
    type Draft = TeamDraft;

    fn id(&self) -> i64 {
        self.id
    }

    fn version(&self) -> i64 {
        self.version
    }
}

impl Record for Game {
    const KIND: EntityKind = EntityKind::Game;
    type Draft = GameDraft;

    fn id(&self) -> i64 {
        self.id
    }

    fn version(&self) -> i64 {
        self.version
    }
}

impl Record for FinancialAction {
    const KIND: EntityKind = EntityKind::FinancialAction;
    type Draft = FinancialActionDraft;

    fn id(&self) -> i64 {
        self.id
    }

    fn version(&self) -> i64 {
        self.version
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn league_name_is_required() {
        let missing = LeagueDraft::default();
        assert!(matches!(
            League::validate(&missing),
            Err(DomainError::Validation { ref field, .. }) if field == "leagueName"
        ));

        let blank = LeagueDraft {
            league_name: Some("   ".to_owned()),
            ..LeagueDraft::default()
        };
        assert!(League::validate(&blank).is_err());

        let ok = LeagueDraft {
            league_name: Some("Premier".to_owned()),
            ..LeagueDraft::default()
        };
        assert!(League::validate(&ok).is_ok());
    }

    #[test]
    fn country_name_is_required_but_teams_have_no_rules() {
        assert!(Country::validate(&CountryDraft::default()).is_err());
        assert!(Team::validate(&TeamDraft::default()).is_ok());
        assert!(Game::validate(&GameDraft::default()).is_ok());
    }
}
