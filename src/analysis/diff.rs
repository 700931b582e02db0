//! Line-change metrics between two revisions

use std::borrow::Cow;

use crate::models::DiffStat;
use crate::vcs::{VcsResult, VersionControlRepository};

/// Counts added and removed lines in patch text.
pub struct DiffMetrics;

impl DiffMetrics {
    /// Line counts between `old` and `new`. `old == None` measures `new`
    /// against the empty tree, so a root commit's lines are all additions.
    pub fn between<R: VersionControlRepository + ?Sized>(
        repo: &R,
        old: Option<&str>,
        new: &str,
    ) -> VcsResult<DiffStat> {
        let patches = repo.diff(old, new)?;
        Ok(Self::from_patches(&patches))
    }

    /// Sum the markers of every per-file patch.
    pub fn from_patches<P: AsRef<[u8]>>(patches: &[P]) -> DiffStat {
        patches
            .iter()
            .map(|patch| Self::count(&decode(patch.as_ref())))
            .fold(DiffStat::default(), |acc, stat| DiffStat {
                additions: acc.additions + stat.additions,
                deletions: acc.deletions + stat.deletions,
            })
    }

    /// Count `"\n+"` and `"\n-"` markers in one decoded patch.
    pub fn count(text: &str) -> DiffStat {
        DiffStat {
            additions: text.matches("\n+").count(),
            deletions: text.matches("\n-").count(),
        }
    }
}

/// UTF-8 when valid, Latin-1 otherwise. Never fails.
pub fn decode(bytes: &[u8]) -> Cow<'_, str> {
    match std::str::from_utf8(bytes) {
        Ok(text) => Cow::Borrowed(text),
        Err(_) => Cow::Owned(bytes.iter().map(|&b| b as char).collect()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::TestRepo;

    #[test]
    fn test_count_markers() {
        let patch = "@@ -1,2 +1,2 @@\n-old\n+new\n+more\n context\n";
        let stat = DiffMetrics::count(patch);
        assert_eq!(stat.additions, 2);
        assert_eq!(stat.deletions, 1);
    }

    #[test]
    fn test_latin1_fallback() {
        // 0xE9 alone is invalid UTF-8
        let patch: &[u8] = b"@@ -0,0 +1,2 @@\n+caf\xe9\n+ok\n-x\n";
        assert_eq!(decode(patch), "@@ -0,0 +1,2 @@\n+café\n+ok\n-x\n");
        let stat = DiffMetrics::from_patches(&[patch]);
        assert_eq!(stat.additions, 2);
        assert_eq!(stat.deletions, 1);
    }

    #[test]
    fn test_between_first_commit_and_edit() {
        let mut fixture = TestRepo::new();
        let first = fixture.commit("Alice", "add", &[("a.txt", Some("one\ntwo\nthree\n"))]);
        let second = fixture.commit(
            "Alice",
            "edit",
            &[("a.txt", Some("one\nTWO\nthree\n")), ("b.txt", Some("b\n"))],
        );

        let repo = fixture.open();
        let initial = DiffMetrics::between(&repo, None, &first).expect("diff");
        assert_eq!(initial, DiffStat { additions: 3, deletions: 0 });

        let edit = DiffMetrics::between(&repo, Some(&first), &second).expect("diff");
        assert_eq!(edit, DiffStat { additions: 2, deletions: 1 });
        assert_eq!(edit.size(), 3);
    }
}
