pub mod expiry;
pub mod model;

pub use expiry::ExpiryPolicy;
pub use model::{
    Auction, AuctionCondition, AuctionFilter, AuctionId, AuctionStatus, NewAuction,
    ValidationError,
};
