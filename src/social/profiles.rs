//! User profiles (`users/{uid}`)

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;

use super::{user_path, SocialError, SocialResult};
use crate::store::{fields, timestamp_now, Direction, Document, DocumentStore, Fields, Filter, Query};

pub const USERS: &str = "users";

/// Default number of username search results
pub const DEFAULT_SEARCH_LIMIT: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub user_id: String,
    pub username: String,
    pub email: String,
    pub avatar_url: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub cravings: Vec<String>,
    pub favorite_cuisines: Vec<String>,
    pub favorite_restaurants: Vec<String>,
    pub dietary_restrictions: Vec<String>,
    pub allergies: Vec<String>,
}

impl UserProfile {
    /// Read a profile document; missing lists read as empty and missing
    /// timestamps as now
    pub fn from_document(doc: &Document) -> Self {
        let now = timestamp_now();
        let timestamp = |field: &str| doc.str(field).map(String::from).unwrap_or_else(|| now.clone());

        Self {
            user_id: doc.id.clone(),
            username: doc.str("username").unwrap_or_default().to_string(),
            email: doc.str("email").unwrap_or_default().to_string(),
            avatar_url: doc.str("avatarUrl").map(String::from),
            created_at: timestamp("createdAt"),
            updated_at: timestamp("updatedAt"),
            cravings: doc.strings("cravings"),
            favorite_cuisines: doc.strings("favoriteCuisines"),
            favorite_restaurants: doc.strings("favoriteRestaurants"),
            dietary_restrictions: doc.strings("dietaryRestrictions"),
            allergies: doc.strings("allergies"),
        }
    }

    pub fn preference(&self, field: PreferenceField) -> &[String] {
        match field {
            PreferenceField::Cravings => &self.cravings,
            PreferenceField::FavoriteCuisines => &self.favorite_cuisines,
            PreferenceField::FavoriteRestaurants => &self.favorite_restaurants,
            PreferenceField::DietaryRestrictions => &self.dietary_restrictions,
            PreferenceField::Allergies => &self.allergies,
        }
    }
}

/// Partial profile update; absent fields are left unchanged
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub username: Option<String>,
    pub email: Option<String>,
    pub avatar_url: Option<String>,
    pub cravings: Option<Vec<String>>,
    pub favorite_cuisines: Option<Vec<String>>,
    pub favorite_restaurants: Option<Vec<String>>,
    pub dietary_restrictions: Option<Vec<String>>,
    pub allergies: Option<Vec<String>>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.to_fields().is_empty()
    }

    fn to_fields(&self) -> Fields {
        let mut out = Fields::new();
        if let Some(username) = &self.username {
            out.insert("username".into(), json!(username));
            out.insert("usernameLower".into(), json!(username.to_lowercase()));
        }
        if let Some(email) = &self.email {
            out.insert("email".into(), json!(email));
        }
        if let Some(avatar_url) = &self.avatar_url {
            out.insert("avatarUrl".into(), json!(avatar_url));
        }
        let lists = [
            (PreferenceField::Cravings, &self.cravings),
            (PreferenceField::FavoriteCuisines, &self.favorite_cuisines),
            (PreferenceField::FavoriteRestaurants, &self.favorite_restaurants),
            (PreferenceField::DietaryRestrictions, &self.dietary_restrictions),
            (PreferenceField::Allergies, &self.allergies),
        ];
        for (field, values) in lists {
            if let Some(values) = values {
                out.insert(field.as_str().into(), json!(values));
            }
        }
        out
    }
}

/// The five editable preference lists
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreferenceField {
    Cravings,
    FavoriteCuisines,
    FavoriteRestaurants,
    DietaryRestrictions,
    Allergies,
}

impl PreferenceField {
    pub fn as_str(&self) -> &'static str {
        match self {
            PreferenceField::Cravings => "cravings",
            PreferenceField::FavoriteCuisines => "favoriteCuisines",
            PreferenceField::FavoriteRestaurants => "favoriteRestaurants",
            PreferenceField::DietaryRestrictions => "dietaryRestrictions",
            PreferenceField::Allergies => "allergies",
        }
    }

    pub fn parse(name: &str) -> Result<Self, SocialError> {
        match name {
            "cravings" => Ok(PreferenceField::Cravings),
            "favoriteCuisines" => Ok(PreferenceField::FavoriteCuisines),
            "favoriteRestaurants" => Ok(PreferenceField::FavoriteRestaurants),
            "dietaryRestrictions" => Ok(PreferenceField::DietaryRestrictions),
            "allergies" => Ok(PreferenceField::Allergies),
            other => Err(SocialError::UnknownField(other.to_string())),
        }
    }
}

/// Search result entry
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub user_id: String,
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

pub struct ProfileService {
    store: Arc<dyn DocumentStore>,
}

impl ProfileService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn get(&self, user_id: &str) -> SocialResult<Option<UserProfile>> {
        let doc = self.store.get(&user_path(user_id)?).await?;
        Ok(doc.as_ref().map(UserProfile::from_document))
    }

    pub async fn require(&self, user_id: &str) -> SocialResult<UserProfile> {
        self.get(user_id)
            .await?
            .ok_or_else(|| SocialError::ProfileNotFound(user_id.to_string()))
    }

    /// Initialise a profile at sign-up
    pub async fn create(
        &self,
        user_id: &str,
        email: &str,
        username: &str,
        avatar_url: Option<&str>,
    ) -> SocialResult<UserProfile> {
        let now = timestamp_now();
        let doc = fields(json!({
            "username": username,
            "usernameLower": username.to_lowercase(),
            "email": email,
            "avatarUrl": avatar_url,
            "createdAt": now,
            "updatedAt": now,
            "cravings": [],
            "favoriteCuisines": [],
            "favoriteRestaurants": [],
            "dietaryRestrictions": [],
            "allergies": [],
        }));

        self.store.set(&user_path(user_id)?, doc, false).await?;
        tracing::info!(user_id = %user_id, "Created user profile");
        self.require(user_id).await
    }

    /// Merge `update` into the profile, creating the document if needed
    pub async fn update(&self, user_id: &str, update: &ProfileUpdate) -> SocialResult<UserProfile> {
        let path = user_path(user_id)?;
        let exists = self.store.get(&path).await?.is_some();

        let mut doc = update.to_fields();
        let now = timestamp_now();
        doc.insert("updatedAt".into(), json!(now));
        if !exists {
            doc.insert("createdAt".into(), json!(now));
        }

        self.store.set(&path, doc, true).await?;
        self.require(user_id).await
    }

    /// Append `value` to a preference list if not already present
    pub async fn add_preference(&self, user_id: &str, field: PreferenceField, value: &str) -> SocialResult<UserProfile> {
        let profile = self.require(user_id).await?;
        let current = profile.preference(field);
        if current.iter().any(|v| v == value) {
            return Ok(profile);
        }

        let mut values = current.to_vec();
        values.push(value.to_string());
        self.write_preference(user_id, field, values).await
    }

    pub async fn remove_preference(&self, user_id: &str, field: PreferenceField, value: &str) -> SocialResult<UserProfile> {
        let profile = self.require(user_id).await?;
        let values: Vec<String> = profile
            .preference(field)
            .iter()
            .filter(|v| v.as_str() != value)
            .cloned()
            .collect();
        self.write_preference(user_id, field, values).await
    }

    async fn write_preference(&self, user_id: &str, field: PreferenceField, values: Vec<String>) -> SocialResult<UserProfile> {
        let mut doc = Fields::new();
        doc.insert(field.as_str().into(), json!(values));
        doc.insert("updatedAt".into(), json!(timestamp_now()));
        self.store.set(&user_path(user_id)?, doc, true).await?;
        self.require(user_id).await
    }

    /// Case-insensitive username prefix search
    pub async fn search_by_username(&self, term: &str, max: usize) -> SocialResult<Vec<UserSummary>> {
        let term = term.trim().to_lowercase();
        if term.is_empty() {
            return Ok(Vec::new());
        }

        let query = Query::new()
            .filter(Filter::gte("usernameLower", term.clone()))
            .filter(Filter::lte("usernameLower", format!("{}\u{f8ff}", term)))
            .order_by("usernameLower", Direction::Ascending)
            .limit(max);

        let docs = self.store.query(USERS, &query).await?;
        Ok(docs
            .iter()
            .map(|d| UserSummary {
                user_id: d.id.clone(),
                username: d.str("username").unwrap_or(d.id.as_str()).to_string(),
                avatar_url: d.get("avatarUrl").and_then(Value::as_str).map(String::from),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::social::testing;

    #[tokio::test]
    async fn test_create_and_get() {
        let service = ProfileService::new(testing::store());
        let profile = service.create("u1", "ana@example.com", "AnaB", None).await.unwrap();

        assert_eq!(profile.username, "AnaB");
        assert!(profile.cravings.is_empty());
        assert!(service.get("nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_missing_fields_default() {
        let store = testing::store();
        store
            .set("users/u2", fields(json!({"username": "bo"})), false)
            .await
            .unwrap();

        let profile = ProfileService::new(store).get("u2").await.unwrap().unwrap();
        assert_eq!(profile.email, "");
        assert!(profile.allergies.is_empty());
        assert!(!profile.created_at.is_empty());
    }

    #[tokio::test]
    async fn test_update_refreshes_username_lower_and_upserts() {
        let store = testing::store();
        let service = ProfileService::new(store.clone());

        let update = ProfileUpdate {
            username: Some("Chef_Kim".to_string()),
            ..Default::default()
        };
        let profile = service.update("u3", &update).await.unwrap();
        assert_eq!(profile.username, "Chef_Kim");

        let doc = store.get("users/u3").await.unwrap().unwrap();
        assert_eq!(doc.str("usernameLower"), Some("chef_kim"));
        assert!(doc.get("createdAt").is_some());
    }

    #[tokio::test]
    async fn test_preferences_add_is_idempotent() {
        let service = ProfileService::new(testing::store());
        service.create("u1", "a@x.com", "ana", None).await.unwrap();

        service.add_preference("u1", PreferenceField::Allergies, "peanuts").await.unwrap();
        let profile = service.add_preference("u1", PreferenceField::Allergies, "peanuts").await.unwrap();
        assert_eq!(profile.allergies, vec!["peanuts"]);

        let profile = service.remove_preference("u1", PreferenceField::Allergies, "peanuts").await.unwrap();
        assert!(profile.allergies.is_empty());
    }

    #[tokio::test]
    async fn test_preference_requires_profile() {
        let service = ProfileService::new(testing::store());
        let err = service
            .add_preference("ghost", PreferenceField::Cravings, "ramen")
            .await
            .unwrap_err();
        assert!(matches!(err, SocialError::ProfileNotFound(_)));
    }

    #[test]
    fn test_preference_field_names() {
        assert_eq!(PreferenceField::parse("favoriteCuisines").unwrap(), PreferenceField::FavoriteCuisines);
        assert!(matches!(PreferenceField::parse("friends"), Err(SocialError::UnknownField(_))));
    }

    #[tokio::test]
    async fn test_search_by_username_prefix() {
        let service = ProfileService::new(testing::store());
        for (uid, name) in [("u1", "Anna"), ("u2", "andy"), ("u3", "Bob"), ("u4", "ANT")] {
            service.create(uid, "x@x.com", name, None).await.unwrap();
        }

        let found: Vec<_> = service
            .search_by_username("  AN ", DEFAULT_SEARCH_LIMIT)
            .await
            .unwrap()
            .into_iter()
            .map(|u| u.username)
            .collect();
        assert_eq!(found, vec!["andy", "Anna", "ANT"]);

        assert!(service.search_by_username("   ", 10).await.unwrap().is_empty());
        assert_eq!(service.search_by_username("an", 1).await.unwrap().len(), 1);
    }
}
