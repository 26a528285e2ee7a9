use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::PgPool;
use tokio::sync::RwLock;

use crate::{
    error::{AppError, AppResult},
    models::{CreateCustomerRequest, Customer, PatchCustomerRequest, ReplaceCustomerRequest},
};

const POSTGRES_SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS customers (
    id BIGSERIAL PRIMARY KEY,
    name TEXT,
    email TEXT UNIQUE,
    address TEXT
)
"#;

/// Storage backend for customer records.
///
/// Not-found is reported as `Ok(None)` (or `Ok(false)` for delete) so the
/// handler layer decides the HTTP mapping; email conflicts are raised here
/// because the check needs the stored data.
#[async_trait]
pub trait CustomerRepository: Send + Sync {
    async fn init(&self) -> AppResult<()>;
    async fn list(&self) -> AppResult<Vec<Customer>>;
    async fn create(&self, payload: CreateCustomerRequest) -> AppResult<Customer>;
    async fn get_by_id(&self, id: i64) -> AppResult<Option<Customer>>;
    async fn replace(
        &self,
        id: i64,
        payload: ReplaceCustomerRequest,
    ) -> AppResult<Option<Customer>>;
    async fn patch(&self, id: i64, payload: PatchCustomerRequest)
    -> AppResult<Option<Customer>>;
    async fn delete(&self, id: i64) -> AppResult<bool>;
}

#[derive(Clone)]
pub struct PgCustomerRepository {
    pool: PgPool,
}

impl PgCustomerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Best-effort pre-check for a friendlier error message. The conflict is
    /// decided by stored identifier, never by value, so a record keeping its
    /// own email on update is not a conflict. The unique index remains the
    /// authoritative guard under concurrent writes.
    async fn email_taken(&self, email: &str, exclude_id: Option<i64>) -> AppResult<bool> {
        let owner: Option<(i64,)> = sqlx::query_as("SELECT id FROM customers WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(match owner {
            Some((owner_id,)) => exclude_id != Some(owner_id),
            None => false,
        })
    }
}

#[async_trait]
impl CustomerRepository for PgCustomerRepository {
    async fn init(&self) -> AppResult<()> {
        sqlx::query(POSTGRES_SCHEMA_SQL).execute(&self.pool).await?;
        Ok(())
    }

    async fn list(&self) -> AppResult<Vec<Customer>> {
        let customers = sqlx::query_as::<_, Customer>(
            "SELECT id, name, email, address FROM customers ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(customers)
    }

    async fn create(&self, payload: CreateCustomerRequest) -> AppResult<Customer> {
        if let Some(email) = payload.email.as_deref()
            && self.email_taken(email, None).await?
        {
            return Err(AppError::EmailConflict(email.to_string()));
        }

        let customer = sqlx::query_as::<_, Customer>(
            r#"
            INSERT INTO customers (name, email, address)
            VALUES ($1, $2, $3)
            RETURNING id, name, email, address
            "#,
        )
        .bind(payload.name)
        .bind(payload.email)
        .bind(payload.address)
        .fetch_one(&self.pool)
        .await?;

        Ok(customer)
    }

    async fn get_by_id(&self, id: i64) -> AppResult<Option<Customer>> {
        let customer = sqlx::query_as::<_, Customer>(
            "SELECT id, name, email, address FROM customers WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(customer)
    }

    async fn replace(
        &self,
        id: i64,
        payload: ReplaceCustomerRequest,
    ) -> AppResult<Option<Customer>> {
        if self.get_by_id(id).await?.is_none() {
            return Ok(None);
        }

        if let Some(email) = payload.email.as_deref()
            && self.email_taken(email, Some(id)).await?
        {
            return Err(AppError::EmailConflict(email.to_string()));
        }

        let customer = sqlx::query_as::<_, Customer>(
            r#"
            UPDATE customers
            SET name = $1, email = $2, address = $3
            WHERE id = $4
            RETURNING id, name, email, address
            "#,
        )
        .bind(payload.name)
        .bind(payload.email)
        .bind(payload.address)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(customer)
    }

    async fn patch(
        &self,
        id: i64,
        payload: PatchCustomerRequest,
    ) -> AppResult<Option<Customer>> {
        let Some(mut customer) = self.get_by_id(id).await? else {
            return Ok(None);
        };

        if let Some(email) = payload.email.as_deref()
            && self.email_taken(email, Some(id)).await?
        {
            return Err(AppError::EmailConflict(email.to_string()));
        }

        payload.apply_to(&mut customer);

        let customer = sqlx::query_as::<_, Customer>(
            r#"
            UPDATE customers
            SET name = $1, email = $2, address = $3
            WHERE id = $4
            RETURNING id, name, email, address
            "#,
        )
        .bind(customer.name)
        .bind(customer.email)
        .bind(customer.address)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(customer)
    }

    async fn delete(&self, id: i64) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM customers WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[derive(Debug, Default)]
pub struct InMemoryCustomerRepository {
    inner: RwLock<MemoryStore>,
}

#[derive(Debug, Default)]
struct MemoryStore {
    customers: HashMap<i64, Customer>,
    next_id: i64,
}

impl MemoryStore {
    fn email_taken(&self, email: &str, exclude_id: Option<i64>) -> bool {
        self.customers
            .values()
            .any(|customer| {
                customer.email.as_deref() == Some(email) && exclude_id != Some(customer.id)
            })
    }
}

impl InMemoryCustomerRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CustomerRepository for InMemoryCustomerRepository {
    async fn init(&self) -> AppResult<()> {
        Ok(())
    }

    async fn list(&self) -> AppResult<Vec<Customer>> {
        let mut customers = self
            .inner
            .read()
            .await
            .customers
            .values()
            .cloned()
            .collect::<Vec<_>>();
        customers.sort_by_key(|customer| customer.id);
        Ok(customers)
    }

    async fn create(&self, payload: CreateCustomerRequest) -> AppResult<Customer> {
        let mut store = self.inner.write().await;

        if let Some(email) = payload.email.as_deref()
            && store.email_taken(email, None)
        {
            return Err(AppError::EmailConflict(email.to_string()));
        }

        store.next_id += 1;
        let customer = Customer {
            id: store.next_id,
            name: payload.name,
            email: payload.email,
            address: payload.address,
        };

        store.customers.insert(customer.id, customer.clone());
        Ok(customer)
    }

    async fn get_by_id(&self, id: i64) -> AppResult<Option<Customer>> {
        Ok(self.inner.read().await.customers.get(&id).cloned())
    }

    async fn replace(
        &self,
        id: i64,
        payload: ReplaceCustomerRequest,
    ) -> AppResult<Option<Customer>> {
        let mut store = self.inner.write().await;

        if !store.customers.contains_key(&id) {
            return Ok(None);
        }

        if let Some(email) = payload.email.as_deref()
            && store.email_taken(email, Some(id))
        {
            return Err(AppError::EmailConflict(email.to_string()));
        }

        let customer = store
            .customers
            .get_mut(&id)
            .ok_or_else(|| AppError::storage("record vanished during replace"))?;

        customer.name = payload.name;
        customer.email = payload.email;
        customer.address = payload.address;

        Ok(Some(customer.clone()))
    }

    async fn patch(
        &self,
        id: i64,
        payload: PatchCustomerRequest,
    ) -> AppResult<Option<Customer>> {
        let mut store = self.inner.write().await;

        if !store.customers.contains_key(&id) {
            return Ok(None);
        }

        if let Some(email) = payload.email.as_deref()
            && store.email_taken(email, Some(id))
        {
            return Err(AppError::EmailConflict(email.to_string()));
        }

        let customer = store
            .customers
            .get_mut(&id)
            .ok_or_else(|| AppError::storage("record vanished during patch"))?;

        payload.apply_to(customer);

        Ok(Some(customer.clone()))
    }

    async fn delete(&self, id: i64) -> AppResult<bool> {
        Ok(self.inner.write().await.customers.remove(&id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(name: &str, email: &str, address: &str) -> CreateCustomerRequest {
        CreateCustomerRequest {
            name: Some(name.to_string()),
            email: Some(email.to_string()),
            address: Some(address.to_string()),
        }
    }

    #[tokio::test]
    async fn create_assigns_fresh_ids() {
        let repo = InMemoryCustomerRepository::new();
        repo.init().await.expect("init should succeed");

        let alice = repo
            .create(request("Alice", "alice@x.com", "US"))
            .await
            .expect("create should succeed");
        let bob = repo
            .create(request("Bob", "bob@x.com", "UK"))
            .await
            .expect("create should succeed");

        assert_eq!(alice.id, 1);
        assert_eq!(bob.id, 2);
        assert_ne!(alice.id, bob.id);
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected_and_nothing_is_stored() {
        let repo = InMemoryCustomerRepository::new();

        repo.create(request("Alice", "alice@x.com", "US"))
            .await
            .expect("create should succeed");

        let err = repo
            .create(request("Impostor", "alice@x.com", "FR"))
            .await
            .expect_err("duplicate email should be rejected");

        assert!(matches!(err, AppError::EmailConflict(email) if email == "alice@x.com"));

        let customers = repo.list().await.expect("list should succeed");
        assert_eq!(customers.len(), 1);
    }

    #[tokio::test]
    async fn get_by_id_misses_on_unknown_id() {
        let repo = InMemoryCustomerRepository::new();
        let found = repo.get_by_id(42).await.expect("get should succeed");
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn replace_overwrites_every_field() {
        let repo = InMemoryCustomerRepository::new();

        let created = repo
            .create(request("Alice", "alice@x.com", "US"))
            .await
            .expect("create should succeed");

        let replaced = repo
            .replace(
                created.id,
                ReplaceCustomerRequest {
                    name: Some("Alicia".to_string()),
                    email: Some("alicia@x.com".to_string()),
                    address: None,
                },
            )
            .await
            .expect("replace should succeed")
            .expect("record should exist");

        assert_eq!(replaced.name.as_deref(), Some("Alicia"));
        assert_eq!(replaced.email.as_deref(), Some("alicia@x.com"));
        // full replace: the missing address field clears the stored value
        assert_eq!(replaced.address, None);
    }

    #[tokio::test]
    async fn replace_with_own_email_never_conflicts() {
        let repo = InMemoryCustomerRepository::new();

        let created = repo
            .create(request("Alice", "alice@x.com", "US"))
            .await
            .expect("create should succeed");

        let replaced = repo
            .replace(
                created.id,
                ReplaceCustomerRequest {
                    name: Some("Alice".to_string()),
                    email: Some("alice@x.com".to_string()),
                    address: Some("CA".to_string()),
                },
            )
            .await
            .expect("self-email replace should not conflict")
            .expect("record should exist");

        assert_eq!(replaced.address.as_deref(), Some("CA"));
    }

    #[tokio::test]
    async fn replace_rejects_email_held_by_another_record() {
        let repo = InMemoryCustomerRepository::new();

        repo.create(request("Alice", "alice@x.com", "US"))
            .await
            .expect("create should succeed");
        let bob = repo
            .create(request("Bob", "bob@x.com", "UK"))
            .await
            .expect("create should succeed");

        let err = repo
            .replace(
                bob.id,
                ReplaceCustomerRequest {
                    name: Some("Bob".to_string()),
                    email: Some("alice@x.com".to_string()),
                    address: Some("UK".to_string()),
                },
            )
            .await
            .expect_err("email of another record should conflict");

        assert!(matches!(err, AppError::EmailConflict(_)));
    }

    #[tokio::test]
    async fn patch_keeps_absent_fields() {
        let repo = InMemoryCustomerRepository::new();

        let created = repo
            .create(request("Alice", "alice@x.com", "US"))
            .await
            .expect("create should succeed");

        let patched = repo
            .patch(
                created.id,
                PatchCustomerRequest {
                    name: Some("Alice2".to_string()),
                    email: None,
                    address: None,
                },
            )
            .await
            .expect("patch should succeed")
            .expect("record should exist");

        assert_eq!(patched.name.as_deref(), Some("Alice2"));
        assert_eq!(patched.email.as_deref(), Some("alice@x.com"));
        assert_eq!(patched.address.as_deref(), Some("US"));
    }

    #[tokio::test]
    async fn empty_patch_leaves_record_unchanged() {
        let repo = InMemoryCustomerRepository::new();

        let created = repo
            .create(request("Alice", "alice@x.com", "US"))
            .await
            .expect("create should succeed");

        let patched = repo
            .patch(created.id, PatchCustomerRequest::default())
            .await
            .expect("patch should succeed")
            .expect("record should exist");

        assert_eq!(patched, created);
    }

    #[tokio::test]
    async fn delete_removes_the_record_permanently() {
        let repo = InMemoryCustomerRepository::new();

        let created = repo
            .create(request("Alice", "alice@x.com", "US"))
            .await
            .expect("create should succeed");

        assert!(repo.delete(created.id).await.expect("delete should succeed"));
        assert!(
            repo.get_by_id(created.id)
                .await
                .expect("get should succeed")
                .is_none()
        );
        assert!(!repo.delete(created.id).await.expect("delete should succeed"));
    }
}
