mod url_matching_tests;
mod verification_tests;
