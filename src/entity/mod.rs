pub mod audit_logs;
pub mod categories;
pub mod newsletter_subscribers;
pub mod order_items;
pub mod orders;
pub mod product_categories;
pub mod products;
pub mod users;

pub use audit_logs::Entity as AuditLogs;
pub use categories::Entity as Categories;
pub use newsletter_subscribers::Entity as NewsletterSubscribers;
pub use order_items::Entity as OrderItems;
pub use orders::Entity as Orders;
pub use product_categories::Entity as ProductCategories;
pub use products::Entity as Products;
pub use users::Entity as Users;
