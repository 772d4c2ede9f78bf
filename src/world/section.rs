use std::fmt;

/// A navigable page of the scene. Each one has a camera checkpoint in the
/// world model and an overlay on the page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Section {
    #[default]
    Home,
    Contact,
    Projects,
    /// Shown when the device is too slow to render the scene.
    Error,
}

impl Section {
    pub const NAVIGABLE: [Section; 3] = [Section::Home, Section::Contact, Section::Projects];

    pub fn name(&self) -> &'static str {
        match self {
            Section::Home => "home",
            Section::Contact => "contact",
            Section::Projects => "projects",
            Section::Error => "error",
        }
    }

    /// Matches node names such as `Home`, `contact-trigger` or `Projects_Checkpoint`.
    pub fn from_node_name(name: &str) -> Option<Section> {
        let name = name.to_ascii_lowercase();
        name.split(|c: char| !c.is_ascii_alphanumeric())
            .find_map(|word| match word {
                "home" => Some(Section::Home),
                "contact" | "contacts" => Some(Section::Contact),
                "project" | "projects" => Some(Section::Projects),
                _ => None,
            })
    }

    /// The DOM id of the section overlay.
    pub fn element_id(&self) -> String {
        format!("{}-section", self.name())
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_names_resolve_to_sections() {
        assert_eq!(Section::from_node_name("Home"), Some(Section::Home));
        assert_eq!(Section::from_node_name("contact-trigger"), Some(Section::Contact));
        assert_eq!(Section::from_node_name("Projects_Checkpoint"), Some(Section::Projects));
        assert_eq!(Section::from_node_name("Poster.001"), None);
        assert_eq!(Section::Error.element_id(), "error-section");
    }
}
