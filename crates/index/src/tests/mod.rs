mod shared_tests;
