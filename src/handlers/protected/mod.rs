// handlers/protected/mod.rs - Credential-bearing proxy handlers
//
// Every handler here copies the caller's Authorization header to the
// backend. The gateway does not check it; a missing or expired token is
// answered by the backend and that answer is relayed unchanged.
//
// Route Prefix: /api/{auth,requisitions,approvals,attachments,signature}/*

pub mod approvals;    // Department approval records
pub mod attachments;  // Requisition attachments (list, upload, rename, delete, download)
pub mod auth;         // User profile read/update
pub mod requisitions; // Requisition CRUD and status transitions
pub mod signature;    // Signature images keyed by email

// RELAY MODES BY RESOURCE:
//
//   auth/*            Negotiate   (profile update passes its body through raw)
//   requisitions/*    Negotiate   (create uses Json)
//   approvals/*       Negotiate
//   attachments/*     Negotiate   (download uses Download, keeping disposition)
//   signature/email   Text        (backend answers with a bare path string)
//   signature/file    Binary      (normalized variant re-encodes as PNG)
//
// Path segments and query values are percent-encoded one by one before they
// reach the backend, so an id like "../x" stays a single segment.
