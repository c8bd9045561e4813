//! Billing Bridge - mirror of billing data between a local system of record
//! and the Asaas payment gateway.
//!
//! Customers, charges, subscriptions and service invoices are created on the
//! gateway first and persisted locally second; gateway webhooks then keep the
//! local statuses current, issue invoices for collected charges and
//! materialize charges the gateway generated on its own for subscriptions.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
