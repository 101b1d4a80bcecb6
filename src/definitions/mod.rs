pub mod client;
pub mod helpers;
pub mod request;
pub mod response;
pub mod x509;

pub use client::{BuiltinClient, ClientProfile, ClientSelection};
pub use request::{AuthSignRequest, CollectCancelRequest, OrderRef, Requirement};
pub use response::{
    AuthSignResponse, CancelResponse, Cert, CollectResponse, CompletionData, Device, ErrorCode,
    ErrorResponse, HintCode, User,
};
