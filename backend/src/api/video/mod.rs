//! Module for the video recording and storage API.
//!
//! Recording is driven through the camera adapter; finished files land in the
//! uploads folder, get encrypted and stored in MongoDB. Stored videos can be
//! decrypted back into the uploads folder on request.

pub mod handlers;
pub mod routes;
