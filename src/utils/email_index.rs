use std::sync::RwLock;
use std::time::Duration;

use autoscale_cuckoo_filter::CuckooFilter;
use moka::future::Cache;

use crate::model::user::normalize_email;
use crate::store::UserStore;

/// Expected capacity and false-positive rate.
/// Tune these based on real user counts.
const FILTER_CAPACITY: usize = 100_000;
const FALSE_POSITIVE_RATE: f64 = 0.001;

/// In-memory view of which emails are registered.
///
/// The cuckoo filter answers "definitely not registered" cheaply, the moka
/// cache remembers emails known to be taken. Neither replaces the unique
/// constraint in the store; they only spare it obvious duplicates.
pub struct EmailIndex {
    filter: RwLock<CuckooFilter<String>>,
    /// true => email is TAKEN
    taken: Cache<String, bool>,
}

impl Default for EmailIndex {
    fn default() -> Self {
        Self::new(FILTER_CAPACITY)
    }
}

impl EmailIndex {
    pub fn new(capacity: usize) -> Self {
        Self {
            filter: RwLock::new(CuckooFilter::new(capacity, FALSE_POSITIVE_RATE)),
            taken: Cache::builder()
                .max_capacity(500_000)
                .time_to_live(Duration::from_secs(86400)) // 24h TTL
                .build(),
        }
    }

    /// Check if an email might be registered (false positives possible)
    pub fn might_exist(&self, email: &str) -> bool {
        let email = normalize_email(email);
        match self.filter.read() {
            Ok(filter) => filter.contains(&email),
            Err(poisoned) => poisoned.into_inner().contains(&email),
        }
    }

    /// True only when the email is known to be registered.
    pub async fn is_taken(&self, email: &str) -> bool {
        if !self.might_exist(email) {
            return false;
        }
        self.taken
            .get(&normalize_email(email))
            .await
            .unwrap_or(false)
    }

    pub async fn mark_taken(&self, email: &str) {
        let email = normalize_email(email);
        self.insert_batch(std::slice::from_ref(&email));
        self.taken.insert(email, true).await;
    }

    pub async fn forget(&self, email: &str) {
        let email = normalize_email(email);
        match self.filter.write() {
            Ok(mut filter) => {
                filter.remove(&email);
            }
            Err(poisoned) => {
                poisoned.into_inner().remove(&email);
            }
        }
        self.taken.invalidate(&email).await;
    }

    /// Loads every registered email, inserting in batches.
    pub async fn warmup<S>(&self, store: &S, batch_size: usize) -> anyhow::Result<usize>
    where
        S: UserStore + ?Sized,
    {
        let emails = store.user_emails().await?;
        let batch_size = batch_size.max(1);

        for batch in emails.chunks(batch_size) {
            let normalized: Vec<String> = batch.iter().map(|e| normalize_email(e)).collect();
            self.insert_batch(&normalized);

            let inserts: Vec<_> = normalized
                .into_iter()
                .map(|email| self.taken.insert(email, true))
                .collect();
            // Await all insertions concurrently
            futures::future::join_all(inserts).await;
        }

        tracing::info!(total = emails.len(), "Email index warmup complete");
        Ok(emails.len())
    }

    /// Insert a batch of normalized emails
    fn insert_batch(&self, emails: &[String]) {
        let mut filter = match self.filter.write() {
            Ok(filter) => filter,
            Err(poisoned) => poisoned.into_inner(),
        };
        for email in emails {
            filter.add(email);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{leave::LeaveSeed, role::Role, user::NewUser};
    use crate::store::MemoryStore;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            email: email.to_string(),
            password_hash: "x".to_string(),
            full_name: "Someone".to_string(),
            role: Role::Employee,
            employee_code: None,
            phone: None,
            department: None,
            position: None,
            hire_date: None,
        }
    }

    #[actix_web::test]
    async fn marks_and_forgets_case_insensitively() {
        let index = EmailIndex::new(1_000);
        assert!(!index.is_taken("jane@example.com").await);

        index.mark_taken("Jane@Example.com").await;
        assert!(index.might_exist("jane@example.com"));
        assert!(index.is_taken("JANE@example.com").await);

        index.forget("jane@example.com").await;
        assert!(!index.is_taken("jane@example.com").await);
    }

    #[actix_web::test]
    async fn warmup_loads_existing_users() {
        let store = MemoryStore::new();
        for email in ["a@example.com", "b@example.com", "c@example.com"] {
            store
                .insert_user(new_user(email), LeaveSeed::default())
                .await
                .unwrap();
        }

        let index = EmailIndex::new(1_000);
        let loaded = index.warmup(&store, 2).await.unwrap();

        assert_eq!(loaded, 3);
        assert!(index.is_taken("b@example.com").await);
        assert!(!index.is_taken("d@example.com").await);
    }
}
