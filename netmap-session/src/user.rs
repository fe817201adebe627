//! User profiles (§3 `UserProfile`), keyed by [`UserId`].

use crate::ids::UserId;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UserProfile {
    pub id: UserId,
    pub display_name: String,
    pub login_name: String,
}
