//! In-memory storage backend.
//!
//! Used by tests and local experiments. It enforces the same contract as the
//! `PostgreSQL` schema: globally unique emails, one rating per
//! `(user_id, store_id)` with overwrite on conflict, and byte-order sorting by
//! name and email.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;

use store_ratings_core::{Email, PrincipalId, RatingId, RatingValue, Role};

use super::{PrincipalStore, RatingStore, RepositoryError};
use crate::models::{
    NewPrincipal, Principal, PrincipalCredentials, Rating, RatingTotals, StoreRatingEntry,
};

#[derive(Debug, Default)]
struct Tables {
    principals: Vec<PrincipalCredentials>,
    ratings: Vec<Rating>,
    next_principal_id: i32,
    next_rating_id: i32,
}

impl Tables {
    fn principal(&self, id: PrincipalId) -> Option<&Principal> {
        self.principals
            .iter()
            .map(|c| &c.principal)
            .find(|p| p.id == id)
    }

    fn totals(&self, store_id: PrincipalId) -> RatingTotals {
        self.ratings
            .iter()
            .filter(|r| r.store_id == store_id)
            .fold(RatingTotals::default(), |acc, r| RatingTotals {
                count: acc.count + 1,
                sum: acc.sum + i64::from(r.value.get()),
            })
    }
}

/// Process-local storage shared between clones.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn by_name(a: &Principal, b: &Principal) -> std::cmp::Ordering {
    a.name.cmp(&b.name).then(a.id.as_i32().cmp(&b.id.as_i32()))
}

impl PrincipalStore for MemoryStore {
    async fn insert_principal(&self, new: NewPrincipal) -> Result<Principal, RepositoryError> {
        let mut tables = self.lock();

        if tables.principals.iter().any(|c| c.principal.email == new.email) {
            return Err(RepositoryError::Conflict("email already exists".to_owned()));
        }

        tables.next_principal_id += 1;
        let principal = Principal {
            id: PrincipalId::new(tables.next_principal_id),
            name: new.name,
            email: new.email,
            address: new.address,
            role: new.role,
            created_at: Utc::now(),
        };

        tables.principals.push(PrincipalCredentials {
            principal: principal.clone(),
            password_hash: new.password_hash,
        });

        Ok(principal)
    }

    async fn find_credentials(
        &self,
        email: &Email,
    ) -> Result<Option<PrincipalCredentials>, RepositoryError> {
        Ok(self
            .lock()
            .principals
            .iter()
            .find(|c| &c.principal.email == email)
            .cloned())
    }

    async fn find_principal(&self, id: PrincipalId) -> Result<Option<Principal>, RepositoryError> {
        Ok(self.lock().principal(id).cloned())
    }

    async fn update_password_hash(
        &self,
        id: PrincipalId,
        password_hash: &str,
    ) -> Result<(), RepositoryError> {
        let mut tables = self.lock();
        let credentials = tables
            .principals
            .iter_mut()
            .find(|c| c.principal.id == id)
            .ok_or(RepositoryError::NotFound)?;

        password_hash.clone_into(&mut credentials.password_hash);
        Ok(())
    }

    async fn list_principals(&self, roles: &[Role]) -> Result<Vec<Principal>, RepositoryError> {
        let mut principals: Vec<Principal> = self
            .lock()
            .principals
            .iter()
            .map(|c| &c.principal)
            .filter(|p| roles.contains(&p.role))
            .cloned()
            .collect();

        principals.sort_by(by_name);
        Ok(principals)
    }

    async fn count_principals(&self, roles: &[Role]) -> Result<i64, RepositoryError> {
        let count = self
            .lock()
            .principals
            .iter()
            .filter(|c| roles.contains(&c.principal.role))
            .count();

        i64::try_from(count).map_err(|e| RepositoryError::DataCorruption(e.to_string()))
    }
}

impl RatingStore for MemoryStore {
    async fn upsert_rating(
        &self,
        user_id: PrincipalId,
        store_id: PrincipalId,
        value: RatingValue,
    ) -> Result<Rating, RepositoryError> {
        let mut tables = self.lock();

        if tables.principal(user_id).is_none() || tables.principal(store_id).is_none() {
            return Err(RepositoryError::NotFound);
        }

        let now = Utc::now();
        if let Some(existing) = tables
            .ratings
            .iter_mut()
            .find(|r| r.user_id == user_id && r.store_id == store_id)
        {
            existing.value = value;
            existing.updated_at = now;
            return Ok(existing.clone());
        }

        tables.next_rating_id += 1;
        let rating = Rating {
            id: RatingId::new(tables.next_rating_id),
            user_id,
            store_id,
            value,
            created_at: now,
            updated_at: now,
        };
        tables.ratings.push(rating.clone());

        Ok(rating)
    }

    async fn rating_totals(&self, store_id: PrincipalId) -> Result<RatingTotals, RepositoryError> {
        Ok(self.lock().totals(store_id))
    }

    async fn stores_with_totals(&self) -> Result<Vec<(Principal, RatingTotals)>, RepositoryError> {
        let tables = self.lock();
        let mut stores: Vec<Principal> = tables
            .principals
            .iter()
            .map(|c| &c.principal)
            .filter(|p| p.role == Role::Store)
            .cloned()
            .collect();
        stores.sort_by(by_name);

        Ok(stores
            .into_iter()
            .map(|store| {
                let totals = tables.totals(store.id);
                (store, totals)
            })
            .collect())
    }

    async fn ratings_for_store(
        &self,
        store_id: PrincipalId,
    ) -> Result<Vec<StoreRatingEntry>, RepositoryError> {
        let tables = self.lock();
        let mut entries = tables
            .ratings
            .iter()
            .filter(|r| r.store_id == store_id)
            .map(|r| {
                let user = tables
                    .principal(r.user_id)
                    .ok_or_else(|| RepositoryError::DataCorruption("dangling rating".to_owned()))?;
                Ok(StoreRatingEntry {
                    user_email: user.email.clone(),
                    value: r.value,
                    created_at: r.created_at,
                    comment: None,
                })
            })
            .collect::<Result<Vec<_>, RepositoryError>>()?;

        entries.sort_by(|a, b| a.user_email.as_str().cmp(b.user_email.as_str()));
        Ok(entries)
    }

    async fn ratings_by_user(&self, user_id: PrincipalId) -> Result<Vec<Rating>, RepositoryError> {
        Ok(self
            .lock()
            .ratings
            .iter()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn count_ratings(&self) -> Result<i64, RepositoryError> {
        let count = self.lock().ratings.len();
        i64::try_from(count).map_err(|e| RepositoryError::DataCorruption(e.to_string()))
    }
}
