use braq_compiler::driver::compile_source;

fn compile(source: &str) -> String {
    compile_source(source).expect("program should compile")
}

fn error_of(source: &str) -> String {
    compile_source(source)
        .expect_err("program should not compile")
        .to_string()
}

fn count_lines(listing: &str, needle: &str) -> usize {
    listing.lines().filter(|line| *line == needle).count()
}

#[test]
fn char_store_and_print() {
    let listing = compile(
        "[] [[[void] main [] [do [ [[char] x] ] [ [<- x 'b'] [print $x] [return] ] ] ]]",
    );
    let lines: Vec<&str> = listing.lines().collect();
    // the char literal lands in the frame byte-wide
    let mov = lines
        .iter()
        .position(|l| *l == "MOV R0,#98")
        .expect("char literal is materialized");
    assert_eq!(lines[mov + 1], "STRB R0,[SP+8]");
    assert_eq!(count_lines(&listing, "STRB R0,.WriteChar"), 1);
    assert_eq!(count_lines(&listing, "HALT"), 1);
    // the copy subroutine body appears exactly once
    assert_eq!(count_lines(&listing, "STRB R3,[R1]"), 1);
}

#[test]
fn struct_field_store_and_load() {
    let listing = compile(
        "[ [Pair [struct [ [[int] a] [[int] b] ]]] ] \
         [[[int] main [] [do [ [[Pair] p] ] [ [<- [. p a] 5] [return [$ [. p a]]] ]]]]",
    );
    // the value, then a direct store through the field pointer
    assert!(listing.contains("MOV R0,#5"));
    assert_eq!(count_lines(&listing, "STR R0,[R1]"), 1);
    // the variable's address is taken at its frame slot
    assert!(listing.contains("ADD R0,SP,#8"));
}

#[test]
fn additive_chain_folds_left() {
    let listing = compile("[] [[[int] main [] [return [+ 1 2 3]]]]");
    assert_eq!(count_lines(&listing, "ADD R0,R0,R1"), 2);
    assert!(listing.contains("MOV R0,#3"));
}

#[test]
fn while_loop_has_a_back_edge() {
    let listing = compile(
        "[] [[[void] main [] [do [ [[int] i] ] [ [<- i 0] \
         [while [< $i 3] [do [ [print $i] [<- i [+ $i 1]] ]]] [return] ]]]]",
    );
    let lines: Vec<&str> = listing.lines().collect();
    let back_edge = lines.iter().enumerate().any(|(i, line)| {
        line.strip_prefix("B label__")
            .map(|_| {
                let target = line.trim_start_matches("B ");
                let def = format!("{target}:");
                lines.iter().position(|l| *l == def.as_str()).map(|d| d < i)
            })
            .flatten()
            .unwrap_or(false)
    });
    assert!(back_edge, "a loop must branch backwards to its repeat label");
    assert!(listing.contains("STR R0,.WriteSignedNum"));
    assert!(lines.iter().any(|l| l.starts_with("BEQ label__")));
}

#[test]
fn call_advances_and_retracts_sp() {
    let listing = compile(
        "[] [[[int] double [[[int] x]] [return [+ $x $x]]] \
         [[int] main [] [return [double 7]]]]",
    );
    assert_eq!(count_lines(&listing, "ADD SP,SP,#8"), 1);
    assert_eq!(count_lines(&listing, "SUB SP,SP,#8"), 1);
    // the argument lands past the return slot and saved LR
    assert!(listing.contains("STR R0,[SP+16]"));
}

#[test]
fn string_literal_goes_to_the_data_stream() {
    let listing = compile("[] [[[void] main [] [do [ [print \"hi\"] [return] ]]]]");
    assert!(listing.contains(".ASCIZ \"hi\""));
    assert!(listing.contains("STR R0,.WriteString"));
    // data comes after the code, before the aligned stack label
    let asciz = listing.find(".ASCIZ").expect("data emitted");
    let halt = listing.find("HALT").expect("entry stub");
    let align = listing.find(".ALIGN 4").expect("stack alignment");
    assert!(halt < asciz && asciz < align);
}

#[test]
fn pointer_offset_scales_by_element_size() {
    let listing = compile(
        "[] [[[void] main [] [do [ [[int] x] ] [ [<- x 5] [@ x 2] [return] ]]]]",
    );
    assert!(listing.contains("ADD R0,R0,#4"));
}

#[test]
fn equality_of_structs_compares_bytes() {
    let listing = compile(
        "[ [Pair [struct [ [[int] a] [[int] b] ]]] ] \
         [[[int] main [] [do [ [[Pair] p] [[Pair] q] ] [ [return [== $p $q]] ]]]]",
    );
    // operand slots sit one aligned span apart
    assert!(listing.contains("LDRB R3,[R0+8]"));
    assert!(listing.contains("LDRB R1,[R0]"));
}

#[test]
fn size_of_forms() {
    let listing = compile(
        "[ [Pair [struct [ [[int] a] [[int] b] ]]] ] \
         [[[int] main [] [return [size_of [Pair]]]]]",
    );
    assert!(listing.contains("MOV R0,#8"));

    let listing = compile("[] [[[int] main [] [return [size_of_value [+ 1 2]]]]]");
    // the operand still runs, then its slot is overwritten with the size
    assert!(listing.contains("ADD R0,R0,R1"));
    assert!(listing.contains("MOV R0,#4"));
}

#[test]
fn short_circuit_forms() {
    let listing = compile("[] [[[int] main [] [return [&& 1 0]]]]");
    assert!(listing.lines().any(|l| l.starts_with("BEQ label__")));

    let listing = compile("[] [[[int] main [] [return [|| 0 1]]]]");
    assert!(listing.lines().any(|l| l.starts_with("BNE label__")));
}

#[test]
fn shift_forms() {
    let listing = compile("[] [[[int] main [] [return [<< 1 4]]]]");
    assert!(listing.contains("LSL R0,R0,R1"));

    let listing = compile("[] [[[int] main [] [return [>>> -8 1]]]]");
    assert!(listing.contains("LSR R0,R0,R1"));

    // arithmetic shift restores the sign bits after a logical shift
    let listing = compile("[] [[[int] main [] [return [>> -8 1]]]]");
    assert!(listing.contains("XOR R0,R0,R3"));
    assert!(listing.contains("SUB R0,R0,R3"));
}

#[test]
fn division_tracks_the_result_sign() {
    let listing = compile("[] [[[int] main [] [return [/ -7 2]]]]");
    assert!(listing.contains("XOR R3,R3,#1"));
    assert!(listing.contains("SUB R0,R0,R1"));
}

#[test]
fn cast_changes_only_the_type() {
    let listing = compile(
        "[] [[[void] main [] [do [ [[ptr char] s] ] [ [<- s [cast [ptr char] 0]] [return] ]]]]",
    );
    assert!(listing.contains("MOV R0,#0"));
}

#[test]
fn special_constant_words_are_int_pointers() {
    let listing = compile(
        "[] [[[void] main [] [do [ [<- .PixelScreen 7] [return] ]]]]",
    );
    assert!(listing.contains("MOV R0,#.PixelScreen"));
}

#[test]
fn missing_main_aborts() {
    assert!(compile_source("[] [[[void] main [] [return]]]").is_ok());
    let err = error_of("[] [[[void] other [] [return]]]");
    assert!(err.contains("no function named 'main'"), "{err}");
}

#[test]
fn type_errors_are_fatal() {
    let err = error_of("[] [[[void] main [] [do [ [? 1 2 'c'] [return] ]]]]");
    assert!(err.contains("branches of '?'"), "{err}");

    let err = error_of(
        "[] [[[void] main [] [do [ [[char] x] ] [ [<- x 5] [return] ]]]]",
    );
    assert!(err.contains("'<-' store"), "{err}");

    let err = error_of("[] [[[int] main [] [return]]]");
    assert!(err.contains("type mismatch in return"), "{err}");
}

#[test]
fn operand_shape_errors_are_fatal() {
    let err = error_of("[] [[[void] main [] [do [ [$ 5] [return] ]]]]");
    assert!(err.contains("must be a pointer"), "{err}");

    let err = error_of("[] [[[void] main [] [do [ [frobnicate 1] [return] ]]]]");
    assert!(err.contains("unknown operator or function"), "{err}");

    let err = error_of(
        "[ [Pair [struct [ [[int] a] [[int] b] ]]] ] \
         [[[void] main [] [do [ [[Pair] p] ] [ [print $p] [return] ]]]]",
    );
    assert!(err.contains("cannot print"), "{err}");
}

#[test]
fn call_arity_and_argument_types_are_checked() {
    let err = error_of(
        "[] [[[int] double [[[int] x]] [return [+ $x $x]]] \
         [[int] main [] [return [double 1 2]]]]",
    );
    assert!(err.contains("expects 1 operands, found 2"), "{err}");

    let err = error_of(
        "[] [[[int] double [[[int] x]] [return [+ $x $x]]] \
         [[int] main [] [return [double 'c']]]]",
    );
    assert!(err.contains("argument 'x' of 'double'"), "{err}");
}

#[test]
fn float_generation_is_rejected() {
    let err = error_of("[] [[[int] main [] [return 1.5]]]");
    assert!(err.contains("floating-point"), "{err}");
}
