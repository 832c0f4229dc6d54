//! Taquilla - MercadoPago payment reconciliation for event ticketing
//!
//! This library provides the core functionality for the Taquilla payment
//! service, including the order/payment ledger, the MercadoPago gateway
//! client, reconciliation of return-flow and webhook notifications, and the
//! HTTP handlers that expose them.

pub mod config;
pub mod db;
pub mod error;
pub mod extractors;
pub mod gateway;
pub mod handlers;
pub mod models;
pub mod money;
pub mod reconcile;
