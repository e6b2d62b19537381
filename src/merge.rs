use crate::models::{ChapterListing, ChapterRecord, ComicRecord, Notification};

/// Folds a freshly fetched listing into `comic`.
///
/// Only the chapter count is used to detect updates: a listing of the same
/// length with different chapters raises nothing. Existing chapter entries
/// are never overwritten or removed. Returns the notification to raise when
/// the count changed.
pub fn merge_chapters(comic: &mut ComicRecord, listing: &ChapterListing, app_name: &str) -> Option<Notification> {
    let notification = if listing.chapters.len() != comic.chapters_count {
        comic.hasupdate = true;
        Some(Notification {
            title: app_name.to_string(),
            body: format!("{} has new updates: {}", comic.title, listing.newest),
            icon: comic.thumbnail.clone(),
        })
    } else {
        None
    };

    for chapter in &listing.chapters {
        comic
            .chapters
            .entry(chapter.group.clone())
            .or_default()
            .entry(chapter.key.clone())
            .or_insert_with(|| ChapterRecord {
                name: chapter.name.clone(),
                ch_link: chapter.link.clone(),
                read: false,
            });
    }

    comic.newestchapter = listing.newest.clone();
    comic.chapters_count = listing.chapters.len();

    notification
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ChapterDescriptor;

    fn comic_with_c1() -> ComicRecord {
        let mut comic = ComicRecord::new("Berserk", "http://a/berserk", "http://a/b.jpg", true);
        comic.hasupdate = false;
        comic.chapters_count = 1;
        comic.chapters.entry("G1".to_string()).or_default().insert(
            "c1".to_string(),
            ChapterRecord {
                name: "Chapter 1 (read)".to_string(),
                ch_link: "http://a/berserk/1".to_string(),
                read: true,
            },
        );
        comic
    }

    #[test]
    fn test_merge_is_additive() {
        let mut comic = comic_with_c1();
        let listing = ChapterListing {
            chapters: vec![
                ChapterDescriptor::new("Chapter 1", "G1", "c1", "http://a/berserk/1-new"),
                ChapterDescriptor::new("Chapter 2", "G1", "c2", "http://a/berserk/2"),
            ],
            newest: "Chapter 2".to_string(),
        };

        let notification = merge_chapters(&mut comic, &listing, "Comic Reader");

        let group = &comic.chapters["G1"];
        assert_eq!(group["c1"].name, "Chapter 1 (read)");
        assert_eq!(group["c1"].ch_link, "http://a/berserk/1");
        assert!(group["c1"].read);
        assert_eq!(group["c2"].name, "Chapter 2");
        assert!(!group["c2"].read);

        assert_eq!(comic.chapters_count, 2);
        assert_eq!(comic.newestchapter, "Chapter 2");
        assert!(comic.hasupdate);
        assert_eq!(
            notification,
            Some(Notification {
                title: "Comic Reader".to_string(),
                body: "Berserk has new updates: Chapter 2".to_string(),
                icon: "http://a/b.jpg".to_string(),
            })
        );
    }

    #[test]
    fn test_equal_count_raises_nothing() {
        let mut comic = comic_with_c1();
        let listing = ChapterListing {
            chapters: vec![ChapterDescriptor::new("Chapter 9", "G2", "c9", "http://a/berserk/9")],
            newest: "Chapter 9".to_string(),
        };

        let notification = merge_chapters(&mut comic, &listing, "Comic Reader");

        assert!(notification.is_none());
        assert!(!comic.hasupdate);
        // New identities are still inserted, only detection is count based.
        assert!(comic.chapters["G2"].contains_key("c9"));
        assert!(comic.chapters["G1"].contains_key("c1"));
        assert_eq!(comic.newestchapter, "Chapter 9");
    }

    #[test]
    fn test_shrinking_listing_keeps_chapters() {
        let mut comic = comic_with_c1();
        let listing = ChapterListing::default();

        assert!(merge_chapters(&mut comic, &listing, "Comic Reader").is_some());
        assert_eq!(comic.chapters_count, 0);
        assert!(comic.chapters["G1"].contains_key("c1"));
    }
}
