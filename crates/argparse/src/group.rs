use crate::argument::ArgRef;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GroupId(pub(crate) usize);

/// Named section of arguments in help and completion output.
#[derive(Debug, Clone)]
pub struct Group {
    id: String,
    header: String,
    pub(crate) arguments: Vec<ArgRef>,
}

impl Group {
    pub(crate) fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            header: String::new(),
            arguments: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn header(&self) -> &str {
        &self.header
    }

    pub fn set_header(&mut self, header: &str) {
        self.header = header.to_string();
    }

    pub fn arguments(&self) -> &[ArgRef] {
        &self.arguments
    }
}
