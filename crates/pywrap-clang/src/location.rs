//! Include paths of discovered declarations.

/// Turns a declaration location into the path generated code includes.
#[derive(Debug, Clone, Default)]
pub struct IncludeResolver {
    roots: Vec<String>,
}

impl IncludeResolver {
    /// Resolver stripping any of `roots`; the first matching root wins.
    pub fn new<I, S>(roots: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let roots = roots
            .into_iter()
            .map(|r| normalize(r.as_ref()).trim_end_matches('/').to_string())
            .filter(|r| !r.is_empty())
            .collect();
        Self { roots }
    }

    pub fn roots(&self) -> &[String] {
        &self.roots
    }

    /// Include path for a printed location such as `include/geo/point.h:3:8`.
    pub fn resolve(&self, location: &str) -> String {
        let location = normalize(location);
        let mut path = location.as_str();

        for root in &self.roots {
            if let Some(rest) = path.strip_prefix(root.as_str()).and_then(|r| r.strip_prefix('/')) {
                path = rest;
                break;
            }
        }

        match path.find(':') {
            Some(end) => path[..end].to_string(),
            None => path.to_string(),
        }
    }
}

fn normalize(path: &str) -> String {
    path.replace('\\', "/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_root_and_position() {
        let resolver = IncludeResolver::new(["/home/me/project/include"]);
        assert_eq!(
            resolver.resolve("/home/me/project/include/geo/point.h:3:8"),
            "geo/point.h"
        );
    }

    #[test]
    fn test_first_matching_root_wins() {
        let resolver = IncludeResolver::new(["/src", "/src/include/"]);
        assert_eq!(resolver.resolve("/src/include/a.h:1:1"), "include/a.h");
        assert_eq!(resolver.roots(), &["/src", "/src/include"]);
    }

    #[test]
    fn test_backslashes_normalized() {
        let resolver = IncludeResolver::new(["C:\\work\\include"]);
        assert_eq!(resolver.resolve("C:\\work\\include\\shapes.h"), "shapes.h");
    }

    #[test]
    fn test_unmatched_location_kept() {
        let resolver = IncludeResolver::new(["include"]);
        assert_eq!(resolver.resolve("other/shapes.h:10:2"), "other/shapes.h");
        assert_eq!(resolver.resolve("includes/shapes.h"), "includes/shapes.h");
    }
}
