//! Category and group based collision filtering.

/// Which fixture pairs are allowed to collide.
///
/// Two fixtures collide when their group says so, or in the absence of a
/// shared group when each one's category is in the other's mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Filter {
    /// Bit per category this fixture belongs to.
    pub category: u64,
    /// Bit per category this fixture collides with.
    pub mask: u64,
    /// Shared group override, positive always collides, negative never.
    pub group: i32,
}

impl Filter {
    /// Whether two filtered fixtures may collide.
    pub fn allows(&self, other: &Filter) -> bool {
        if self.group != 0 && self.group == other.group {
            return self.group > 0;
        }

        (self.category & other.mask) != 0 && (other.category & self.mask) != 0
    }
}

impl Default for Filter {
    fn default() -> Self {
        Self {
            category: 1,
            mask: u64::MAX,
            group: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Filter;

    /// Groups override the category test.
    #[test]
    fn test_groups() {
        let positive = Filter {
            group: 3,
            ..Filter::default()
        };
        let negative = Filter {
            group: -2,
            category: 1,
            mask: u64::MAX,
        };

        assert!(positive.allows(&positive));
        assert!(!negative.allows(&negative));
        // Different groups fall back to categories
        assert!(positive.allows(&negative));
    }

    /// Category masks must be checked both ways.
    #[test]
    fn test_categories() {
        let a = Filter {
            category: 0b01,
            mask: 0b10,
            group: 0,
        };
        let b = Filter {
            category: 0b10,
            mask: 0b11,
            group: 0,
        };
        let c = Filter {
            category: 0b10,
            mask: 0b10,
            group: 0,
        };

        assert!(a.allows(&b));
        assert!(!a.allows(&c));
    }
}
