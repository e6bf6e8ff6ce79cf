//! Property-based tests for path manipulation functions.
//!
//! These tests use proptest to generate random inputs and verify that
//! invariants hold for all possible inputs.

#[cfg(test)]
mod proptest_tests {
    use crate::path::{depth, directory_of, normalize_relative, parent_dir, ROOT_DIR};
    use proptest::prelude::*;

    fn segment() -> impl Strategy<Value = String> {
        "[a-zA-Z0-9_-]{1,8}"
    }

    fn segments() -> impl Strategy<Value = Vec<String>> {
        prop::collection::vec(segment(), 0..6)
    }

    proptest! {
        /// Property: normalizing is idempotent
        #[test]
        fn normalize_is_idempotent(parts in segments()) {
            let once = normalize_relative(parts.join("/")).unwrap();
            let twice = normalize_relative(&once).unwrap();
            prop_assert_eq!(once, twice);
        }

        /// Property: `.` segments and trailing separators never change the result
        #[test]
        fn normalize_ignores_cur_dir_noise(parts in segments()) {
            let plain = normalize_relative(parts.join("/")).unwrap();
            let noisy = format!("./{}/", parts.join("/./"));
            prop_assert_eq!(normalize_relative(noisy).unwrap(), plain);
        }

        /// Property: walking parents from any directory reaches the root in
        /// exactly `depth` steps
        #[test]
        fn parent_walk_terminates_at_root(parts in segments()) {
            let dir = normalize_relative(parts.join("/")).unwrap();
            let mut current = dir.as_str();
            let mut steps = 0;
            while let Some(parent) = parent_dir(current) {
                current = parent;
                steps += 1;
            }
            prop_assert_eq!(current, ROOT_DIR);
            prop_assert_eq!(steps, depth(&dir));
        }

        /// Property: the directory of `dir/file` is `dir`
        #[test]
        fn directory_of_strips_file_name(parts in segments(), file in segment()) {
            let dir = parts.join("/");
            let file_path = if dir.is_empty() { file } else { format!("{}/{}", dir, file) };
            prop_assert_eq!(directory_of(file_path).unwrap(), dir);
        }
    }
}
