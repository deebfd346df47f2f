//! Presentation Layer - IPC handlers, DTOs, router

pub mod dto;
pub mod handlers;
pub mod middleware;
pub mod router;
