//! Cluster group membership: granting and revoking the admin roles.

use crate::error::{Error, Result};
use crate::ocm::clusters::cluster_path;
use crate::ocm::OcmClient;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::json;

pub const DEDICATED_ADMINS: &str = "dedicated-admins";
pub const CLUSTER_ADMINS: &str = "cluster-admins";

lazy_static! {
    // Usernames may not be '~', '.', '..', or contain ':', '/' or '%'.
    static ref BAD_USERNAME_RE: Regex =
        Regex::new(r"^(~|\.?\.|.*[:/%].*)$").expect("static regex");
}

pub fn is_valid_username(username: &str) -> bool {
    !username.is_empty() && !BAD_USERNAME_RE.is_match(username)
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct User {
    #[serde(default)]
    pub id: String,
}

fn group_users_path(cluster_id: &str, group: &str) -> String {
    format!("{}/groups/{}/users", cluster_path(cluster_id), group)
}

impl OcmClient {
    pub async fn group_users(&self, cluster_id: &str, group: &str) -> Result<Vec<User>> {
        self.list_all(&group_users_path(cluster_id, group), -1, None, None)
            .await
    }

    pub async fn add_group_user(
        &self,
        cluster_id: &str,
        group: &str,
        username: &str,
    ) -> Result<User> {
        if !is_valid_username(username) {
            return Err(Error::InvalidInput {
                message: format!(
                    "Username '{}' isn't valid: it must not be '~', '.' or '..' and must \
                     not contain ':', '/' or '%'",
                    username
                ),
            });
        }
        self.post_json(
            &group_users_path(cluster_id, group),
            &[],
            &json!({"id": username}),
        )
        .await
    }

    pub async fn remove_group_user(
        &self,
        cluster_id: &str,
        group: &str,
        username: &str,
    ) -> Result<()> {
        self.delete(&format!("{}/{}", group_users_path(cluster_id, group), username))
            .await
    }
}
