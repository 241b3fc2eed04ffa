// Read path: single upload, per-user listing and stats, admin listing.
// All queries are simple filtered/sorted reads against cv_uploads.

pub mod handlers;
