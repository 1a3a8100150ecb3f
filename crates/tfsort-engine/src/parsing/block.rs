/// The fixed vocabulary of top-level block kinds. Anything else (e.g.
/// `moved`, `import`, `check`) is carried as `Other` with its keyword.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockKind {
    Resource,
    Data,
    Module,
    Variable,
    Output,
    Locals,
    Provider,
    Terraform,
    Other(String),
}

impl BlockKind {
    pub fn from_keyword(keyword: &str) -> Self {
        match keyword {
            "resource" => Self::Resource,
            "data" => Self::Data,
            "module" => Self::Module,
            "variable" => Self::Variable,
            "output" => Self::Output,
            "locals" | "local" => Self::Locals,
            "provider" => Self::Provider,
            "terraform" => Self::Terraform,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn keyword(&self) -> &str {
        match self {
            Self::Resource => "resource",
            Self::Data => "data",
            Self::Module => "module",
            Self::Variable => "variable",
            Self::Output => "output",
            Self::Locals => "locals",
            Self::Provider => "provider",
            Self::Terraform => "terraform",
            Self::Other(keyword) => keyword,
        }
    }
}

/// One top-level declaration extracted from a source file.
#[derive(Debug, Clone)]
pub struct Block {
    pub kind: BlockKind,
    /// Ordered labels from the header, e.g. resource type + name.
    pub labels: Vec<String>,
    /// Exact source text for re-emission: attached leading comments, the
    /// header, and the balanced body.
    pub raw_text: String,
    /// Text between the block's outer braces. The resolver scans this,
    /// never the header.
    pub body: String,
    /// Position in the source file; used only as the sort tie-break.
    pub original_index: usize,
}

impl Block {
    /// Unique key within one file. Label-less blocks (`locals`, `terraform`)
    /// are keyed by declaration order since several may legitimately coexist.
    pub fn identity(&self) -> String {
        if self.labels.is_empty() {
            format!("{}#{}", self.kind.keyword(), self.original_index)
        } else {
            let mut identity = self.kind.keyword().to_string();
            for label in &self.labels {
                identity.push('.');
                identity.push_str(label);
            }
            identity
        }
    }

    /// The address other blocks use to mention this one, when it has one.
    /// Resources are addressed bare (`type.name`), everything else carries a
    /// kind prefix. Providers and settings blocks are not addressable.
    pub fn address(&self) -> Option<String> {
        match (&self.kind, self.labels.as_slice()) {
            (BlockKind::Resource, [kind, name]) => Some(format!("{kind}.{name}")),
            (BlockKind::Data, [kind, name]) => Some(format!("data.{kind}.{name}")),
            (BlockKind::Module, [name]) => Some(format!("module.{name}")),
            (BlockKind::Variable, [name]) => Some(format!("var.{name}")),
            (BlockKind::Output, [name]) => Some(format!("output.{name}")),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(kind: BlockKind, labels: &[&str], index: usize) -> Block {
        Block {
            kind,
            labels: labels.iter().map(|l| l.to_string()).collect(),
            raw_text: String::new(),
            body: String::new(),
            original_index: index,
        }
    }

    #[test]
    fn labeled_identity_joins_kind_and_labels() {
        let b = block(BlockKind::Resource, &["aws_subnet", "main"], 0);
        assert_eq!(b.identity(), "resource.aws_subnet.main");
    }

    #[test]
    fn labelless_identity_uses_declaration_order() {
        let b = block(BlockKind::Locals, &[], 3);
        assert_eq!(b.identity(), "locals#3");
    }

    #[test]
    fn resource_address_is_bare() {
        let b = block(BlockKind::Resource, &["aws_subnet", "main"], 0);
        assert_eq!(b.address().as_deref(), Some("aws_subnet.main"));
    }

    #[test]
    fn data_address_is_prefixed() {
        let b = block(BlockKind::Data, &["aws_ami", "base"], 0);
        assert_eq!(b.address().as_deref(), Some("data.aws_ami.base"));
    }

    #[test]
    fn variable_address_uses_var_prefix() {
        let b = block(BlockKind::Variable, &["port"], 0);
        assert_eq!(b.address().as_deref(), Some("var.port"));
    }

    #[test]
    fn provider_has_no_address() {
        let b = block(BlockKind::Provider, &["aws"], 0);
        assert_eq!(b.address(), None);
    }

    #[test]
    fn unknown_keyword_round_trips() {
        let kind = BlockKind::from_keyword("moved");
        assert_eq!(kind, BlockKind::Other("moved".to_string()));
        assert_eq!(kind.keyword(), "moved");
    }
}
