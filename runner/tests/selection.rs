use runner::Selection;
use runner::selection::is_excluded;

#[test]
fn empty_selection_includes_everything() {
    let selection = Selection::<usize>::default();
    assert!((1..10).all(|i| !is_excluded(&selection, &i)));
}

#[test]
fn only_wins_over_except() {
    let selection = Selection {
        only: vec![2, 4],
        except: vec![2, 3],
    };
    for i in 1..=6 {
        assert_eq!(selection.is_excluded(&i), !(i == 2 || i == 4), "position {}", i);
    }
}

#[test]
fn except_excludes_listed_keys() {
    let selection = Selection::except(["slow".to_string()]);
    assert!(selection.is_excluded(&"slow".to_string()));
    assert!(!selection.is_excluded(&"fast".to_string()));
}

#[test]
fn selection_deserializes_with_missing_lists() {
    let selection: Selection<usize> = toml::from_str("only = [3]").unwrap();
    assert_eq!(selection, Selection::only([3]));
    assert!(!selection.is_excluded(&3));
    assert!(selection.is_excluded(&1));
}
