/// A case-insensitive file name wildcard (`*` any run, `?` one character).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchPattern {
    pattern: Vec<char>,
}

impl SearchPattern {
    #[must_use]
    pub fn new(pattern: &str) -> Self {
        Self { pattern: pattern.chars().flat_map(char::to_lowercase).collect() }
    }

    #[must_use]
    pub fn matches(&self, file_name: &str) -> bool {
        let name: Vec<char> = file_name.chars().flat_map(char::to_lowercase).collect();
        let (mut p, mut n) = (0, 0);
        // Position of the last `*` and the name index it was tried against.
        let mut backtrack: Option<(usize, usize)> = None;

        while n < name.len() {
            match self.pattern.get(p) {
                Some('*') => {
                    backtrack = Some((p, n));
                    p += 1;
                }
                Some(&c) if c == '?' || c == name[n] => {
                    p += 1;
                    n += 1;
                }
                _ => match backtrack {
                    Some((star, at)) => {
                        p = star + 1;
                        n = at + 1;
                        backtrack = Some((star, at + 1));
                    }
                    None => return false,
                },
            }
        }
        self.pattern[p..].iter().all(|&c| c == '*')
    }
}
