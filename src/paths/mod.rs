//! Lexical path helpers shared by the resolver, the rule matcher and the file injector.
//!
//! Paths inside a build pipeline are compared as forward-slash strings so that manifests
//! come out identical on every platform. The submodules split the primitives (joining,
//! resolving, relativising), pattern satisfaction, and the check for stylesheet URLs that
//! never map onto an output path.

mod satisfy;
mod urls;
mod util;

pub use satisfy::path_satisfies;
pub use urls::references_outside_output;
pub use util::{dirname, extname, join, normalize, relative, resolve, to_slash};
