use braq_compiler::driver::compile_source;

fn compile(source: &str) -> String {
    compile_source(source).expect("program should compile")
}

fn is_label_def(line: &str) -> bool {
    line.starts_with("label__") && line.ends_with(':')
}

/// The target of a branch line, if the line is a branch.
fn branch_target(line: &str) -> Option<&str> {
    for prefix in ["BL ", "BEQ ", "BNE ", "BGT ", "BLT ", "B "] {
        if let Some(target) = line.strip_prefix(prefix) {
            return Some(target);
        }
    }
    None
}

#[test]
fn listing_skeleton_order() {
    let listing = compile("[] [[[void] main [] [return]]]");
    let lines: Vec<&str> = listing.lines().collect();
    assert!(lines[0].starts_with("MOV SP,#label__"));
    assert!(lines[1].starts_with("BL label__"));
    assert_eq!(lines[2], "HALT");
    // the copy subroutine opens right after the entry stub
    assert!(is_label_def(lines[3]));
    assert_eq!(lines[lines.len() - 2], ".ALIGN 4");
    assert!(is_label_def(lines[lines.len() - 1]));
}

#[test]
fn labels_are_32_hex_digits() {
    let listing = compile("[] [[[void] main [] [return]]]");
    for line in listing.lines().filter(|l| is_label_def(l)) {
        let digits = &line["label__".len()..line.len() - 1];
        assert_eq!(digits.len(), 32, "{line}");
        assert!(digits.chars().all(|c| c.is_ascii_hexdigit()), "{line}");
    }
}

#[test]
fn no_two_adjacent_label_lines() {
    // an if with an empty body ends two control labels back to back
    let listing = compile(
        "[] [[[void] main [] [do [ [if 1 [do []]] [return] ]]]]",
    );
    let lines: Vec<&str> = listing.lines().collect();
    for pair in lines.windows(2) {
        assert!(
            !(is_label_def(pair[0]) && is_label_def(pair[1])),
            "adjacent labels survived: {} / {}",
            pair[0],
            pair[1]
        );
    }
}

#[test]
fn merged_labels_keep_their_references_valid() {
    let listing = compile(
        "[] [[[void] main [] [do [ [if 1 [do []]] [return] ]]]]",
    );
    let lines: Vec<&str> = listing.lines().collect();
    let defined: Vec<String> = lines
        .iter()
        .filter(|l| is_label_def(l))
        .map(|l| l[..l.len() - 1].to_string())
        .collect();
    for line in &lines {
        if let Some(target) = branch_target(line) {
            assert!(
                defined.iter().any(|d| d == target),
                "undefined branch target in: {line}"
            );
        }
    }
}

#[test]
fn every_branch_target_is_defined() {
    let listing = compile(
        "[] [[[int] half [[[int] x]] [return [/ $x 2]]] \
         [[void] main [] [do [ [[int] i] ] [ [<- i [half 8]] \
         [while [< $i 3] [do [ [<- i [+ $i 1]] ]]] [return] ]]]]",
    );
    let lines: Vec<&str> = listing.lines().collect();
    let defined: Vec<String> = lines
        .iter()
        .filter(|l| is_label_def(l))
        .map(|l| l[..l.len() - 1].to_string())
        .collect();
    for line in &lines {
        if let Some(target) = branch_target(line) {
            assert!(
                defined.iter().any(|d| d == target),
                "undefined branch target in: {line}"
            );
        }
    }
}

#[test]
fn sp_moves_pair_up_across_the_listing() {
    let listing = compile(
        "[] [[[int] inc [[[int] x]] [return [+ $x 1]]] \
         [[int] main [] [return [inc [inc 1]]]]]",
    );
    let advances = listing
        .lines()
        .filter(|l| l.starts_with("ADD SP,SP,#"))
        .count();
    let retreats = listing
        .lines()
        .filter(|l| l.starts_with("SUB SP,SP,#"))
        .count();
    assert_eq!(advances, retreats);
    assert_eq!(advances, 2);
}
