use std::fmt;

#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, serde::Deserialize, serde::Serialize)]
pub struct UserId(pub String);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The authenticated member looking at the page
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Viewer {
    pub id: UserId,
    pub nick_name: Option<String>,
    pub name: Option<String>,
    pub avatar_url: Option<String>,
}

impl Viewer {
    pub fn new(id: UserId) -> Viewer {
        Viewer {
            id,
            nick_name: None,
            name: None,
            avatar_url: None,
        }
    }

    pub fn display_name(&self) -> &str {
        [&self.nick_name, &self.name]
            .into_iter()
            .flatten()
            .map(|n| n.trim())
            .find(|n| !n.is_empty())
            .unwrap_or("Anonymous")
    }
}
