//! # cas-ticket
//!
//! Ticket and expiration model for the CAS ticket server.
//!
//! This crate defines the value types at the bottom of the dependency
//! graph: tickets, expiration policies, ticket-id generation, and the
//! service/authentication types the ticket core stores and forwards.
//!
//! ## Ticket graph
//!
//! A ticket-granting ticket (TGT) is the root or an interior node of a
//! session's ticket graph; service tickets are its leaves. Parent links
//! are stored as ticket ids, never as object references: whether a
//! parent is still alive is answered by looking its id up in the
//! registry, so removing a node never leaves dangling pointers behind.

#![forbid(unsafe_code)]
#![deny(warnings)]
#![deny(missing_docs)]

pub mod authentication;
pub mod error;
pub mod expiration;
pub mod granting;
pub mod id;
pub mod registered_service;
pub mod service;
pub mod service_ticket;
pub mod ticket;

pub use authentication::Authentication;
pub use error::{TicketError, TicketResult};
pub use expiration::{ExpirationPolicy, TicketUsage};
pub use granting::TicketGrantingTicket;
pub use id::TicketIdGenerator;
pub use registered_service::{
    InMemoryServicesManager, LogoutKind, RegisteredService, ServicesManager,
};
pub use service::Service;
pub use service_ticket::ServiceTicket;
pub use ticket::{
    PROXY_GRANTING_TICKET_PREFIX, PROXY_TICKET_PREFIX, SERVICE_TICKET_PREFIX,
    TICKET_GRANTING_TICKET_PREFIX, Ticket, TicketKind,
};
