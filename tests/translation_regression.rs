use c2fortran::block_restructure::restructure_output;
use c2fortran::{check_fortran_output, translate_c};

fn trimmed(output: &str) -> Vec<&str> {
    output.lines().map(|l| l.trim()).collect()
}

#[test]
fn case_a_factorial_function_wrapper() {
    let src = include_str!("fixtures/xfact.c");
    let out = translate_c(src);
    assert!(out.contains("! #include <stdio.h>"));
    assert!(out.contains("! #include <limits.h>"));
    assert!(out.contains("  ! Function to compute factorial of an integer\n  function factorial(n) result(factorial_result)\n"));
    assert!(out.contains("    integer, intent(in) :: n\n"));
    assert!(out.contains("    integer :: factorial_result\n"));
    assert!(out.contains("    integer :: result\n"));
    assert!(out.contains("    integer :: i\n"));
    assert!(out.contains("  end function factorial\n"));
}

#[test]
fn case_a_factorial_control_flow() {
    let src = include_str!("fixtures/xfact.c");
    let out = translate_c(src);
    let lines = trimmed(&out);

    let base = lines.iter().position(|l| *l == "if (n == 0) then").unwrap();
    assert_eq!(lines[base + 1], "factorial_result = 1");
    assert_eq!(lines[base + 2], "end if");

    assert!(lines.contains(&"do i = 1, n"));
    assert!(lines.contains(&"if (result > huge(0) / i) then"));
    assert!(lines.contains(&"print *, \"Error: Factorial overflow\""));
    assert!(lines.contains(&"result = result * i"));
    assert!(lines.contains(&"factorial_result = result"));
    assert!(lines.contains(&"! Base case: factorial of 0 is 1"));
}

#[test]
fn case_a_program_prompt_without_newline() {
    let src = include_str!("fixtures/xfact.c");
    let out = translate_c(src);
    assert!(out.contains("write(*, '(*(g0))', advance='no') \"factorial(3) = \", factorial(3)"));
    assert!(out.contains("! return 0 (ignored in program)"));
    assert!(check_fortran_output(&out).is_valid);
}

#[test]
fn case_b_test_table_and_sizeof() {
    let src = include_str!("fixtures/xfactorial.c");
    let out = translate_c(src);
    assert!(out.contains("integer, dimension(7) :: test_cases = [0, 1, 5, 10, 12, 20, -1]"));
    assert!(out.contains(
        "num_tests = (size(test_cases) * storage_size(test_cases) / 8) / (storage_size(test_cases(1)) / 8)"
    ));
    assert!(out.contains("do i = 0, num_tests - 1"));
    assert!(out.contains("n = test_cases(i + 1)"));
    assert!(out.contains("if (result > 0 .or. n == 0) then"));
}

#[test]
fn case_b_blank_line_printf() {
    let src = include_str!("fixtures/xfactorial.c");
    let out = translate_c(src);
    let lines = trimmed(&out);
    let banner = lines
        .iter()
        .position(|l| *l == "print *, \"=====================\"")
        .unwrap();
    assert_eq!(lines[banner + 1], "print *");
}

#[test]
fn case_b_interactive_loop() {
    let src = include_str!("fixtures/xfactorial.c");
    let out = translate_c(src);
    let lines = trimmed(&out);

    let read = lines
        .iter()
        .position(|l| *l == "read(*, *, iostat=io_status) num")
        .unwrap();
    assert_eq!(lines[read - 1], "do");
    assert_eq!(lines[read + 1], "if (.not. (io_status == 0 .and. num /= -1)) exit");
    assert_eq!(out.matches("integer :: io_status").count(), 1);
}

#[test]
fn case_b_redeclared_result_is_wide() {
    let src = include_str!("fixtures/xfactorial.c");
    let out = translate_c(src);
    let program = out.find("program main").unwrap();
    let body = &out[program..];
    assert_eq!(body.matches(":: result").count(), 1);
    assert!(body.contains("integer(kind=8) :: result"));
}

#[test]
fn case_b_output_structure() {
    let src = include_str!("fixtures/xfactorial.c");
    let out = translate_c(src);
    let result = check_fortran_output(&out);
    assert!(result.is_valid, "{:?}", result.errors);
    assert_eq!(restructure_output(&out), out);
}
