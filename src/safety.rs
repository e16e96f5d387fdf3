//! Advisory code safety filter
//!
//! A substring blacklist applied to generated code before execution. This is
//! a textual heuristic, not a sandbox: it does not parse the code, does not
//! catch aliased or obfuscated access, and bounds no resource usage. A `true`
//! result is not a safety guarantee and callers must not treat it as one.

/// Substrings denoting filesystem, process, or dynamic-evaluation access
const BLACKLIST: [&str; 7] = [
    "os.", "sys.", "subprocess", "shutil", "open(", "eval(", "exec(",
];

/// Returns false if the code text contains any blacklisted substring.
pub fn is_code_safe(code: &str) -> bool {
    !BLACKLIST.iter().any(|term| code.contains(term))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_process_and_eval_access() {
        assert!(!is_code_safe("import subprocess\nsubprocess.run(['ls'])"));
        assert!(!is_code_safe("eval('1 + 1')"));
        assert!(!is_code_safe("exec('print(1)')"));
    }

    #[test]
    fn rejects_filesystem_access() {
        assert!(!is_code_safe("open('data.csv')"));
        assert!(!is_code_safe("shutil.rmtree('/tmp/x')"));
        assert!(!is_code_safe("os.remove('file')"));
        assert!(!is_code_safe("sys.exit(1)"));
    }

    #[test]
    fn accepts_plain_plotting_code() {
        let code = "import pandas as pd\n\
                    totals = df.groupby('Region')['Sales'].sum()\n\
                    plt.pie(totals, labels=totals.index)\n\
                    plt.show()";
        assert!(is_code_safe(code));
        assert!(is_code_safe("x = 1 + 2"));
    }

    #[test]
    fn is_purely_textual() {
        // Aliased access slips through; this filter is advisory only.
        assert!(is_code_safe("sp = __import__('sub' + 'process')"));
    }
}
