//! Contestant rows.

use serde::Serialize;
use sqlx::FromRow;
use xsuportal_core::types::DbId;

/// A row from the `contestants` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Contestant {
    pub id: String,
    pub team_id: Option<DbId>,
}

/// A contestant that belongs to a team, and can therefore receive
/// team-scoped notifications.
#[derive(Debug, Clone, PartialEq, Eq, Hash, FromRow, Serialize)]
pub struct Recipient {
    pub id: String,
    pub team_id: DbId,
}

impl Contestant {
    /// `None` for contestants without a team.
    pub fn into_recipient(self) -> Option<Recipient> {
        self.team_id.map(|team_id| Recipient {
            id: self.id,
            team_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contestant_without_team_is_not_a_recipient() {
        let c = Contestant {
            id: "alice".into(),
            team_id: None,
        };
        assert!(c.into_recipient().is_none());
    }

    #[test]
    fn contestant_with_team_becomes_recipient() {
        let c = Contestant {
            id: "bob".into(),
            team_id: Some(5),
        };
        assert_eq!(
            c.into_recipient(),
            Some(Recipient {
                id: "bob".into(),
                team_id: 5
            })
        );
    }
}
