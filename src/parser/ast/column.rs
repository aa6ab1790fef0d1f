use std::fmt;

#[derive(Clone, PartialEq, Eq, Hash)]
pub enum Column {
    Name { name: String },
    WithCollection { collection: String, name: String },
}

impl Column {
    /// Builds a column from dotted segments; the first of several segments is the collection.
    pub fn from_segments(mut segments: Vec<String>) -> Self {
        if segments.len() < 2 {
            return Column::Name { name: segments.pop().unwrap_or_default() };
        }

        let collection = segments.remove(0);
        Column::WithCollection { collection, name: segments.join(".") }
    }

    pub fn from_path(path: &str) -> Self {
        Self::from_segments(path.split('.').map(str::to_string).collect())
    }

    pub fn path(&self) -> String {
        match self {
            Column::Name { name } => name.clone(),
            Column::WithCollection { collection, name } => format!("{}.{}", collection, name),
        }
    }

    pub fn collection(&self) -> Option<&str> {
        match self {
            Column::Name { .. } => None,
            Column::WithCollection { collection, .. } => Some(collection),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Column::Name { name } | Column::WithCollection { name, .. } => name,
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path())
    }
}

impl fmt::Debug for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Column::Name { .. } => write!(f, "Column::Name({})", self),
            Column::WithCollection { .. } => write!(f, "Column::WithCollection({})", self),
        }
    }
}
