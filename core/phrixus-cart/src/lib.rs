//! Cart domain built on the Phrixus entity mapping layer.
//!
//! - [`Cart`], [`CartItem`], [`User`]: domain models over [`phrixus_model::Entity`]
//! - [`CartService`]: generic and owner-scoped cart operations used by the
//!   HTTP layer
//!
//! Call [`registry`] once at startup and share the result.

/// Gives an `Entity` newtype deref access to the entity plus `Display` and
/// `Serialize` from it.
macro_rules! entity_newtype {
    ($ty:ident) => {
        impl std::ops::Deref for $ty {
            type Target = phrixus_model::Entity;

            fn deref(&self) -> &Self::Target {
                &self.0
            }
        }

        impl std::ops::DerefMut for $ty {
            fn deref_mut(&mut self) -> &mut Self::Target {
                &mut self.0
            }
        }

        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                std::fmt::Display::fmt(&self.0, f)
            }
        }

        impl serde::Serialize for $ty {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serde::Serialize::serialize(&self.0, serializer)
            }
        }
    };
}
pub(crate) use entity_newtype;

mod cart;
mod cart_item;
mod error;
mod service;
mod user;

pub use cart::{Cart, CartStatus};
pub use cart_item::CartItem;
pub use error::{ServiceError, ServiceResult};
pub use service::CartService;
pub use user::{AccessToken, User};

use phrixus_model::{ModelResult, Registry};

/// Builds the registry holding every cart domain type.
pub fn registry() -> ModelResult<Registry> {
    Registry::builder()
        .register::<Cart>()
        .register::<CartItem>()
        .register::<User>()
        .build()
}
