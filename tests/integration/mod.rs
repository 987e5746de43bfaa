/// Integration test target: engine workflows over a real database file

mod engine_workflow;
