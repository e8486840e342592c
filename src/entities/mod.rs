pub mod address;
pub mod cart;
pub mod cart_item;
pub mod company;
pub mod order;
pub mod order_item;
pub mod payment;
pub mod product;
pub mod store;
pub mod user;

pub use address::{Entity as Address, Model as AddressModel};
pub use cart::{Entity as Cart, Model as CartModel};
pub use cart_item::{Entity as CartItem, Model as CartItemModel};
pub use company::{Entity as Company, Model as CompanyModel};
pub use order::{Entity as Order, Model as OrderModel};
pub use order_item::{Entity as OrderItem, Model as OrderItemModel};
pub use payment::{Entity as Payment, Model as PaymentModel};
pub use product::{Entity as Product, Model as ProductModel};
pub use store::{Entity as Store, Model as StoreModel};
pub use user::{Entity as User, Model as UserModel};
