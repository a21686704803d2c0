//! Cart/Transaction Engine
//!
//! Each user owns at most one `cart` transaction. Checkout flips the cart to
//! `pending` with a compare-and-set and immediately opens a fresh cart, so a
//! user always ends up with exactly one open cart. Staff disposition is the
//! second compare-and-set edge: `pending -> approved | rejected`, applied at
//! most once.

use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use crate::db::models::{
    StoreTransaction, TransactionCreate, TransactionFull, TransactionLine, TransactionStatus,
    TransactionUpdate,
};
use crate::db::repository::{ProductRepository, TransactionRepository, record_id};
use crate::utils::{AppError, AppResult};

#[derive(Clone)]
pub struct CartService {
    transactions: TransactionRepository,
    products: ProductRepository,
}

impl CartService {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            transactions: TransactionRepository::new(db.clone()),
            products: ProductRepository::new(db),
        }
    }

    /// The user's open cart; never auto-creates one
    pub async fn get_cart(&self, user_id: &str) -> AppResult<StoreTransaction> {
        let user_rid = record_id("user", user_id);
        self.transactions
            .find_cart(&user_rid)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Cart for user {}", user_id)))
    }

    /// Add `amount` of a product to the cart, creating the cart if absent
    ///
    /// An existing line for the product is incremented, not replaced.
    pub async fn add_line(
        &self,
        user_id: &str,
        product_id: &str,
        amount: i64,
    ) -> AppResult<StoreTransaction> {
        if amount < 1 {
            return Err(AppError::validation("Amount must be at least 1"));
        }
        self.products
            .find_by_id(product_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Product {}", product_id)))?;

        let user_rid = record_id("user", user_id);
        let product_rid = record_id("product", product_id);

        match self.transactions.find_cart(&user_rid).await? {
            Some(cart) => {
                let id = cart_key(&cart)?;
                let mut lines = cart.lines;
                match lines.iter_mut().find(|l| l.product == product_rid) {
                    Some(line) => line.amount += amount,
                    None => lines.push(TransactionLine {
                        product: product_rid,
                        amount,
                    }),
                }
                self.transactions
                    .set_lines(&id, lines)
                    .await?
                    .ok_or_else(|| AppError::conflict("Cart was already checked out"))
            }
            None => Ok(self
                .transactions
                .create(TransactionCreate {
                    user: user_rid,
                    lines: vec![TransactionLine {
                        product: product_rid,
                        amount,
                    }],
                    status: TransactionStatus::Cart,
                })
                .await?),
        }
    }

    /// Overwrite a line's amount
    pub async fn set_line(
        &self,
        user_id: &str,
        product_id: &str,
        amount: i64,
    ) -> AppResult<StoreTransaction> {
        if amount < 1 {
            return Err(AppError::validation("Amount must be at least 1"));
        }

        let cart = self.get_cart(user_id).await?;
        let product_rid = record_id("product", product_id);

        let id = cart_key(&cart)?;
        let mut lines = cart.lines;
        let line = lines
            .iter_mut()
            .find(|l| l.product == product_rid)
            .ok_or_else(|| AppError::not_found(format!("Product {} not in cart", product_id)))?;
        line.amount = amount;
        self.transactions
            .set_lines(&id, lines)
            .await?
            .ok_or_else(|| AppError::conflict("Cart was already checked out"))
    }

    /// Remove a product's line from the cart
    pub async fn remove_line(&self, user_id: &str, product_id: &str) -> AppResult<StoreTransaction> {
        let cart = self.get_cart(user_id).await?;
        let product_rid = record_id("product", product_id);

        let before = cart.lines.len();
        let lines: Vec<TransactionLine> = cart
            .lines
            .iter()
            .filter(|l| l.product != product_rid)
            .cloned()
            .collect();
        if lines.len() == before {
            return Err(AppError::not_found(format!(
                "Product {} not in cart",
                product_id
            )));
        }

        let id = cart_key(&cart)?;
        self.transactions
            .set_lines(&id, lines)
            .await?
            .ok_or_else(|| AppError::conflict("Cart was already checked out"))
    }

    /// Submit the cart for staff review
    ///
    /// Compare-and-set `cart -> pending`, then open a fresh empty cart. A
    /// concurrent double submit of the same cart goes through exactly once.
    pub async fn checkout(&self, user_id: &str) -> AppResult<StoreTransaction> {
        let cart = self.get_cart(user_id).await?;
        if cart.lines.is_empty() {
            return Err(AppError::validation("Cart is empty"));
        }

        let id = cart_key(&cart)?;
        let pending = self
            .transactions
            .checkout(&id)
            .await?
            .ok_or_else(|| AppError::conflict("Cart was already checked out"))?;

        self.transactions
            .create(TransactionCreate {
                user: cart.user.clone(),
                lines: Vec::new(),
                status: TransactionStatus::Cart,
            })
            .await?;

        tracing::info!(user = user_id, transaction = %id, "Cart checked out");
        Ok(pending)
    }

    /// Staff disposition of a submitted order
    ///
    /// `status` must be `approved` or `rejected`; only a `pending`
    /// transaction can be dispositioned, and only once.
    pub async fn disposition(&self, tx_id: &str, status: &str) -> AppResult<StoreTransaction> {
        let next = match status {
            "approved" => TransactionStatus::Approved,
            "rejected" => TransactionStatus::Rejected,
            other => {
                return Err(AppError::validation(format!(
                    "Status must be approved or rejected, got {}",
                    other
                )));
            }
        };

        self.transactions
            .find_by_id(tx_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Transaction {}", tx_id)))?;

        let updated = self
            .transactions
            .disposition(tx_id, next)
            .await?
            .ok_or_else(|| AppError::conflict("Transaction is not pending disposition"))?;

        tracing::info!(transaction = tx_id, status = next.as_str(), "Transaction dispositioned");
        Ok(updated)
    }

    // ===== Generic admin surface =====

    pub async fn create(&self, data: TransactionCreate) -> AppResult<StoreTransaction> {
        Ok(self.transactions.create(data).await?)
    }

    /// All transactions with product records resolved
    pub async fn list_all(&self) -> AppResult<Vec<TransactionFull>> {
        Ok(self.transactions.find_all().await?)
    }

    /// One user's transactions with product records resolved
    pub async fn list_by_user(&self, user_id: &str) -> AppResult<Vec<TransactionFull>> {
        let user_rid = record_id("user", user_id);
        Ok(self.transactions.find_by_user(&user_rid).await?)
    }

    pub async fn get(&self, tx_id: &str) -> AppResult<StoreTransaction> {
        self.transactions
            .find_by_id(tx_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Transaction {}", tx_id)))
    }

    /// Free-form admin patch, kept alongside the constrained operations
    pub async fn update(&self, tx_id: &str, patch: TransactionUpdate) -> AppResult<StoreTransaction> {
        Ok(self.transactions.update(tx_id, patch).await?)
    }

    pub async fn delete(&self, tx_id: &str) -> AppResult<()> {
        Ok(self.transactions.delete(tx_id).await?)
    }
}

fn cart_key(cart: &StoreTransaction) -> AppResult<String> {
    cart.id
        .as_ref()
        .map(|id| id.key().to_string())
        .ok_or_else(|| AppError::internal("Cart record has no id"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbService;
    use crate::db::models::{ProductCreate, UserCreate};
    use crate::db::repository::UserRepository;

    async fn setup() -> (CartService, String, String) {
        let db = DbService::memory().await.expect("in-memory db");
        let service = CartService::new(db.db.clone());

        let users = UserRepository::new(db.db.clone());
        let user = users
            .create(UserCreate {
                username: "alice".to_string(),
                email: "alice@example.com".to_string(),
                password_hash: "hash".to_string(),
                phone_number: None,
                gender: None,
                is_admin: false,
                is_active: true,
            })
            .await
            .expect("seed user");
        let user_id = user.id.expect("user id").key().to_string();

        let products = ProductRepository::new(db.db);
        let product = products
            .create(ProductCreate {
                name: "Campus hoodie".to_string(),
                description: "Warm".to_string(),
                price: 29.99,
                count_in_stock: 10,
                image_url: None,
            })
            .await
            .expect("seed product");
        let product_id = product.id.expect("product id").key().to_string();

        (service, user_id, product_id)
    }

    #[tokio::test]
    async fn test_get_cart_never_auto_creates() {
        let (service, user_id, _) = setup().await;

        let missing = service.get_cart(&user_id).await;
        assert!(matches!(missing, Err(AppError::NotFound(_))));

        // Still absent after the failed read
        let missing = service.get_cart(&user_id).await;
        assert!(matches!(missing, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_add_line_creates_cart_then_increments() {
        let (service, user_id, product_id) = setup().await;

        let cart = service
            .add_line(&user_id, &product_id, 1)
            .await
            .expect("first add");
        assert_eq!(cart.status, TransactionStatus::Cart);
        assert_eq!(cart.lines.len(), 1);
        assert_eq!(cart.lines[0].amount, 1);

        let cart = service
            .add_line(&user_id, &product_id, 2)
            .await
            .expect("second add");
        assert_eq!(cart.lines.len(), 1);
        assert_eq!(cart.lines[0].amount, 3);
    }

    #[tokio::test]
    async fn test_add_line_validations() {
        let (service, user_id, product_id) = setup().await;

        let zero = service.add_line(&user_id, &product_id, 0).await;
        assert!(matches!(zero, Err(AppError::Validation(_))));

        let ghost = service.add_line(&user_id, "no_such_product", 1).await;
        assert!(matches!(ghost, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_set_line_overwrites_amount() {
        let (service, user_id, product_id) = setup().await;

        service
            .add_line(&user_id, &product_id, 5)
            .await
            .expect("add");
        let cart = service
            .set_line(&user_id, &product_id, 2)
            .await
            .expect("set");
        assert_eq!(cart.lines[0].amount, 2);
    }

    #[tokio::test]
    async fn test_remove_line() {
        let (service, user_id, product_id) = setup().await;

        service
            .add_line(&user_id, &product_id, 1)
            .await
            .expect("add");
        let cart = service
            .remove_line(&user_id, &product_id)
            .await
            .expect("remove");
        assert!(cart.lines.is_empty());

        let absent = service.remove_line(&user_id, &product_id).await;
        assert!(matches!(absent, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_line_edit_after_checkout_is_rejected() {
        let (service, user_id, product_id) = setup().await;

        service
            .add_line(&user_id, &product_id, 1)
            .await
            .expect("add");
        let cart = service.get_cart(&user_id).await.expect("cart");
        let cart_id = cart.id.expect("id").key().to_string();

        // A submit lands between a stale cart read and its line rewrite
        service
            .transactions
            .checkout(&cart_id)
            .await
            .expect("checkout")
            .expect("cart was open");

        // The stale rewrite is refused and the submitted order keeps its lines
        let stale = service
            .transactions
            .set_lines(&cart_id, Vec::new())
            .await
            .expect("query");
        assert!(stale.is_none());

        let stored = service.get(&cart_id).await.expect("get");
        assert_eq!(stored.status, TransactionStatus::Pending);
        assert_eq!(stored.lines.len(), 1);
        assert_eq!(stored.lines[0].amount, 1);
    }

    #[tokio::test]
    async fn test_checkout_submits_and_opens_fresh_cart() {
        let (service, user_id, product_id) = setup().await;

        service
            .add_line(&user_id, &product_id, 2)
            .await
            .expect("add");
        let pending = service.checkout(&user_id).await.expect("checkout");
        assert_eq!(pending.status, TransactionStatus::Pending);
        assert_eq!(pending.lines.len(), 1);

        // Exactly one cart afterwards, and it is empty
        let cart = service.get_cart(&user_id).await.expect("fresh cart");
        assert_eq!(cart.status, TransactionStatus::Cart);
        assert!(cart.lines.is_empty());
        assert_ne!(cart.id, pending.id);
    }

    #[tokio::test]
    async fn test_checkout_empty_cart_rejected() {
        let (service, user_id, product_id) = setup().await;

        service
            .add_line(&user_id, &product_id, 1)
            .await
            .expect("add");
        service
            .remove_line(&user_id, &product_id)
            .await
            .expect("remove");

        let result = service.checkout(&user_id).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_disposition_applies_once() {
        let (service, user_id, product_id) = setup().await;

        service
            .add_line(&user_id, &product_id, 1)
            .await
            .expect("add");
        let pending = service.checkout(&user_id).await.expect("checkout");
        let tx_id = pending.id.expect("tx id").key().to_string();

        let approved = service
            .disposition(&tx_id, "approved")
            .await
            .expect("disposition");
        assert_eq!(approved.status, TransactionStatus::Approved);

        // Second disposition of any kind is rejected
        let again = service.disposition(&tx_id, "rejected").await;
        assert!(matches!(again, Err(AppError::Conflict(_))));

        let stored = service.get(&tx_id).await.expect("get");
        assert_eq!(stored.status, TransactionStatus::Approved);
    }

    #[tokio::test]
    async fn test_disposition_validations() {
        let (service, user_id, product_id) = setup().await;

        service
            .add_line(&user_id, &product_id, 1)
            .await
            .expect("add");
        let cart = service.get_cart(&user_id).await.expect("cart");
        let cart_id = cart.id.expect("id").key().to_string();

        let bad_status = service.disposition(&cart_id, "maybe").await;
        assert!(matches!(bad_status, Err(AppError::Validation(_))));

        // A cart that was never checked out cannot be dispositioned
        let not_pending = service.disposition(&cart_id, "approved").await;
        assert!(matches!(not_pending, Err(AppError::Conflict(_))));

        let missing = service.disposition("no_such_tx", "approved").await;
        assert!(matches!(missing, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_list_by_user_resolves_products() {
        let (service, user_id, product_id) = setup().await;

        service
            .add_line(&user_id, &product_id, 2)
            .await
            .expect("add");
        service.checkout(&user_id).await.expect("checkout");

        let all = service.list_by_user(&user_id).await.expect("list");
        // The pending order plus the fresh cart
        assert_eq!(all.len(), 2);
        let pending = all
            .iter()
            .find(|t| t.status == TransactionStatus::Pending)
            .expect("pending order");
        assert_eq!(pending.lines[0].product.name, "Campus hoodie");
        assert_eq!(pending.lines[0].amount, 2);
    }
}
