/// Unit test target: storage adapter behavior behind the store traits

mod storage_tests;
