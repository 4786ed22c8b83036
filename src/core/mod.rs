// src/core/mod.rs

// The `core` module is the whole reconnaissance engine. The binary's
// presentation shim only ever touches `scanner::run_full_scan` and the
// types in `models`.

/// Data structures and models used throughout the engine, such as
/// `DomainReport`, `ProbeResult` and the various classifier structs.
pub mod models;

/// Syntactic domain-name validation.
pub mod validator;

/// Static, process-wide classifier pattern tables (CDN hostname
/// signatures and hosting-provider organization fragments).
pub mod knowledge_base;

/// The scanning logic: DNS, ports, TLS, CDN/hosting classification and
/// the payload probe engine, plus the orchestrator that assembles a
/// `DomainReport`.
pub mod scanner;
