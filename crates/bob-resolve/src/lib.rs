//! Request-time resolution for Bob.
//!
//! One engine serves both public routes: [`Entry::Primary`] for
//! `/{alias}/{path…}` and [`Entry::ReferrerOnly`] for the static asset
//! route. Resolution proceeds in fixed steps:
//!
//! 1. classify the request as a page (no extension) or a sub-resource
//! 2. find the alias: explicit path segment, then `Referer`, then give up
//! 3. resolve it through the [`AliasRegistry`](bob_alias::AliasRegistry)
//! 4. strip the alias prefix; an empty remainder means `index.html`
//! 5. fetch `{hash}/{path}`, retrying `index.html` once
//! 6. rewrite the `<base>` of HTML documents to `/{alias}/`
//!
//! There is no SPA fallback: a missing file is [`Outcome::NotFound`].

pub mod error;
pub mod resolver;

pub use error::{ResolveError, ResolveResult};
pub use resolver::{Entry, Miss, Outcome, Resolver, ServedFile, CACHE_CONTROL};
