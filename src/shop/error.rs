// Shop error taxonomy
// Every failure is terminal for the request that caused it

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ShopError {
    #[error("product {0:?} does not exist")]
    UnknownProduct(String),

    #[error("quantity {0} is outside the accepted range")]
    InvalidQuantity(i64),

    #[error("cart is empty")]
    EmptyCart,

    #[error("order {0:?} not found")]
    OrderNotFound(String),

    #[error("not authorized to access order {0:?}")]
    Unauthorized(String),

    #[error("order {0:?} has already been processed")]
    AlreadyProcessed(String),

    #[error("payment details are incomplete")]
    IncompletePayment,
}

pub type ShopResult<T> = Result<T, ShopError>;
