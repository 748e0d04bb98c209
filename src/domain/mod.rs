//! Domain primitives shared by the services and the HTTP layer.
//!
//! Identifiers follow the Newtype pattern so a user id can never be passed
//! where a recipe id or session id is expected.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Generates a fresh random (v4) identifier.
            #[must_use]
            pub fn generate() -> Self {
                Self(Uuid::new_v4())
            }

            #[must_use]
            pub const fn from_uuid(id: Uuid) -> Self {
                Self(id)
            }

            #[must_use]
            pub const fn value(&self) -> Uuid {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s).map(Self)
            }
        }
    };
}

uuid_id!(
    /// Unique identifier of a registered user.
    UserId
);

uuid_id!(
    /// Identifier of a session token row (not the secret token string).
    SessionId
);

uuid_id!(
    /// Unique identifier of a recipe.
    RecipeId
);

/// Role tag stored with every user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    /// Read access plus own-session management.
    #[default]
    User,
    /// May add, edit and delete recipes.
    Admin,
}

impl UserStatus {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
        }
    }

    #[must_use]
    pub const fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl fmt::Display for UserStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "admin" => Ok(Self::Admin),
            other => Err(format!("unknown user status: {other}")),
        }
    }
}

/// Unit of measurement for a recipe ingredient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    Gram,
    Milliliter,
    Teaspoon,
    Tablespoon,
    /// Countable items ("2 eggs").
    Piece,
}

impl Unit {
    pub const ALL: [Self; 5] = [
        Self::Gram,
        Self::Milliliter,
        Self::Teaspoon,
        Self::Tablespoon,
        Self::Piece,
    ];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Gram => "gram",
            Self::Milliliter => "milliliter",
            Self::Teaspoon => "teaspoon",
            Self::Tablespoon => "tablespoon",
            Self::Piece => "piece",
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Unit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|u| u.as_str() == s)
            .ok_or_else(|| format!("unknown unit: {s}"))
    }
}

/// The authenticated caller, resolved from a valid session token by the auth
/// middleware and attached to the request extensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user_id: UserId,
    /// The bearer token the request was authenticated with.
    pub token: String,
    pub username: String,
    pub status: UserStatus,
}

impl Principal {
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        self.status.is_admin()
    }
}

/// Lower-cases and trims an email address so lookups and the unique index
/// agree on one spelling.
#[must_use]
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_round_trip_through_strings() {
        let id = UserId::generate();
        let parsed: UserId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
        assert!("not-a-uuid".parse::<RecipeId>().is_err());
    }

    #[test]
    fn status_parses_known_tags_only() {
        assert_eq!("admin".parse::<UserStatus>(), Ok(UserStatus::Admin));
        assert_eq!("user".parse::<UserStatus>(), Ok(UserStatus::User));
        assert!("root".parse::<UserStatus>().is_err());
        assert!(UserStatus::Admin.is_admin());
        assert!(!UserStatus::default().is_admin());
    }

    #[test]
    fn units_match_their_wire_names() {
        for unit in Unit::ALL {
            assert_eq!(unit.as_str().parse::<Unit>(), Ok(unit));
        }
        assert!("cup".parse::<Unit>().is_err());
        assert_eq!(serde_json::to_string(&Unit::Tablespoon).unwrap(), "\"tablespoon\"");
    }

    #[test]
    fn normalize_email_folds_case_and_whitespace() {
        assert_eq!(normalize_email("  Ann@X.com "), "ann@x.com");
    }
}
