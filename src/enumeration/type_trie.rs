use std::fmt::Debug;

/**
 * A set of type vectors over the alphabet {0, ..., K-1}, stored as a prefix
 * tree, supporting the query "is some stored vector dominated by this one?".
 *
 * A vector u is dominated by v if u[i] is either 0 or v[i] for every
 * position i. Trailing zeroes are ignored throughout, so vectors of
 * different lengths may be mixed.
 *
 * Nodes live in an arena; node 0 is the root.
 */
#[derive(Clone)]
pub struct TypeTrie<const K: usize> {
    nodes: Vec<Node<K>>,
    entries: usize,
}

#[derive(Clone)]
struct Node<const K: usize> {
    children: [Option<usize>; K],
    element_here: bool,
}

impl<const K: usize> Node<K> {
    fn new() -> Self {
        Self {
            children: [None; K],
            element_here: false,
        }
    }
}

impl<const K: usize> TypeTrie<K> {
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::new()],
            entries: 0,
        }
    }

    pub fn clear(&mut self) {
        self.nodes.truncate(1);
        self.nodes[0] = Node::new();
        self.entries = 0;
    }

    pub fn is_empty(&self) -> bool {
        self.entries == 0
    }

    /**
     * The number of distinct vectors that were inserted.
     */
    pub fn len(&self) -> usize {
        self.entries
    }

    pub fn insert(&mut self, entry: &[u8]) {
        let entry = strip_trailing_zeroes(entry);

        let mut node = 0;
        for value in entry {
            let value = *value as usize;
            assert!(value < K, "type {} is out of range", value);
            node = match self.nodes[node].children[value] {
                Some(child) => child,
                None => {
                    self.nodes.push(Node::new());
                    let child = self.nodes.len() - 1;
                    self.nodes[node].children[value] = Some(child);
                    child
                }
            };
        }

        if !self.nodes[node].element_here {
            self.nodes[node].element_here = true;
            self.entries += 1;
        }
    }

    /**
     * Returns whether some vector in this set is dominated by the given vector.
     */
    pub fn dominates(&self, vector: &[u8]) -> bool {
        let vector = strip_trailing_zeroes(vector);
        let len = vector.len();
        let value_at = |level: usize| vector.get(level).map_or(0, |v| *v as usize);

        //candidate[i]: the next node to try at depth i, if any
        let mut candidate: Vec<Option<usize>> = vec![None; len + 2];
        candidate[0] = Some(0);
        let mut level: isize = 0;

        while level >= 0 {
            let l = level as usize;
            match candidate[l] {
                Some(node) if l <= len => {
                    if self.nodes[node].element_here {
                        return true;
                    }

                    //try child 0 first, then the child of the vector's own type
                    let children = &self.nodes[node].children;
                    candidate[l + 1] = children[0].or(children[value_at(l)]);
                    level += 1;
                }
                _ => {
                    //out of siblings, or deeper than the vector: backtrack
                    level -= 1;
                    if level > 0 {
                        let l = level as usize;
                        let parent = candidate[l - 1].map(|p| &self.nodes[p].children);
                        candidate[l] = match parent {
                            Some(children) if candidate[l] == children[0] && value_at(l - 1) != 0 => children[value_at(l - 1)],
                            _ => None,
                        };
                    } else if level == 0 {
                        candidate[0] = None;
                    }
                }
            }
        }

        false
    }
}

impl<const K: usize> Default for TypeTrie<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const K: usize> Debug for TypeTrie<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "trie for {} types with {} entries in {} nodes", K, self.entries, self.nodes.len())
    }
}

fn strip_trailing_zeroes(vector: &[u8]) -> &[u8] {
    let len = vector.iter().rposition(|x| *x != 0).map_or(0, |p| p + 1);
    &vector[..len]
}
