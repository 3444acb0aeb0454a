//! Authorization middleware run in front of controllers.
//!
//! Each submodule guards one resource family. The middleware only decides
//! whether the caller may reach the handler; the handler still goes through
//! the `domain` layer, which applies the business rules.

pub(crate) mod conversations;
