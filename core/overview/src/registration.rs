//! Shapes in which a host hands over a plugin to register.

/// A plugin registration as seen by the host.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum RegistrationForm {
    /// A plugin factory whose name is known up front.
    Plugin { name: String },
    /// A module wrapper whose default export is the actual plugin.
    Bundled(Box<RegistrationForm>),
    /// A factory that is not synchronously introspectable, such as a pending
    /// import. It is registered with the host but left out of the overview.
    Deferred { description: String },
}

impl RegistrationForm {
    #[must_use]
    pub fn plugin(name: impl Into<String>) -> Self {
        RegistrationForm::Plugin { name: name.into() }
    }

    #[must_use]
    pub fn bundled(default: RegistrationForm) -> Self {
        RegistrationForm::Bundled(Box::new(default))
    }

    #[must_use]
    pub fn deferred(description: impl Into<String>) -> Self {
        RegistrationForm::Deferred {
            description: description.into(),
        }
    }
}
