mod literal_tests;
